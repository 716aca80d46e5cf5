//! Aggregate reports over visible tours.

use crate::error::AppError;
use crate::intercept::capture;
use crate::service::tours::{parse_start_date, TOURS};
use crate::store::{Document, DocumentStore};
use chrono::Datelike;
use serde_json::{json, Value};
use std::cmp::Ordering;
use std::collections::BTreeMap;

pub const STATS_MIN_RATING: f64 = 4.5;
const PLAN_MONTHS: usize = 12;

pub struct ReportService;

impl ReportService {
    /// Per-difficulty figures for tours rated at least [`STATS_MIN_RATING`], cheapest group first.
    pub async fn tour_stats(store: &dyn DocumentStore) -> Result<Vec<Value>, AppError> {
        let tours = capture(store.scan(&TOURS)).await?;
        Ok(difficulty_stats(&tours))
    }

    /// Tour starts per month of `year`, busiest month first.
    pub async fn monthly_plan(store: &dyn DocumentStore, year: i32) -> Result<Vec<Value>, AppError> {
        let tours = capture(store.scan(&TOURS)).await?;
        Ok(starts_per_month(&tours, year))
    }
}

#[derive(Default)]
struct Group {
    num_tours: u64,
    num_ratings: f64,
    rating_sum: f64,
    rating_count: u64,
    price_sum: f64,
    price_count: u64,
    min_price: Option<f64>,
    max_price: Option<f64>,
}

impl Group {
    fn add(&mut self, tour: &Document) {
        self.num_tours += 1;
        self.num_ratings += number(tour, "ratingsQuantity").unwrap_or(0.0);
        if let Some(rating) = number(tour, "ratingsAverage") {
            self.rating_sum += rating;
            self.rating_count += 1;
        }
        if let Some(price) = number(tour, "price") {
            self.price_sum += price;
            self.price_count += 1;
            self.min_price = Some(self.min_price.map_or(price, |m| m.min(price)));
            self.max_price = Some(self.max_price.map_or(price, |m| m.max(price)));
        }
    }

    fn avg_price(&self) -> Option<f64> {
        average(self.price_sum, self.price_count)
    }
}

fn number(doc: &Document, field: &str) -> Option<f64> {
    doc.get(field).and_then(Value::as_f64)
}

fn average(sum: f64, count: u64) -> Option<f64> {
    (count > 0).then(|| sum / count as f64)
}

/// Whole numbers render as integers.
fn to_json(n: Option<f64>) -> Value {
    match n {
        Some(n) if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 => Value::from(n as i64),
        Some(n) => serde_json::Number::from_f64(n).map_or(Value::Null, Value::Number),
        None => Value::Null,
    }
}

pub(crate) fn difficulty_stats(tours: &[Document]) -> Vec<Value> {
    let mut groups: BTreeMap<Option<String>, Group> = BTreeMap::new();
    for tour in tours {
        if !number(tour, "ratingsAverage").map_or(false, |r| r >= STATS_MIN_RATING) {
            continue;
        }
        let difficulty = tour.get("difficulty").and_then(Value::as_str).map(str::to_string);
        groups.entry(difficulty).or_default().add(tour);
    }

    let mut groups: Vec<(Option<String>, Group)> = groups.into_iter().collect();
    groups.sort_by(|(_, a), (_, b)| match (a.avg_price(), b.avg_price()) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (x, y) => x.is_some().cmp(&y.is_some()),
    });
    groups
        .into_iter()
        .map(|(difficulty, g)| {
            json!({
                "difficulty": difficulty,
                "numTours": g.num_tours,
                "numRatings": to_json(Some(g.num_ratings)),
                "avgRating": to_json(average(g.rating_sum, g.rating_count)),
                "avgPrice": to_json(g.avg_price()),
                "minPrice": to_json(g.min_price),
                "maxPrice": to_json(g.max_price),
            })
        })
        .collect()
}

pub(crate) fn starts_per_month(tours: &[Document], year: i32) -> Vec<Value> {
    let mut months: BTreeMap<u32, (u64, Vec<Value>)> = BTreeMap::new();
    for tour in tours {
        let Some(Value::Array(dates)) = tour.get("startDates") else {
            continue;
        };
        let name = tour.get("name").cloned().unwrap_or(Value::Null);
        for start in dates.iter().filter_map(Value::as_str).filter_map(parse_start_date) {
            if start.year() != year {
                continue;
            }
            let entry = months.entry(start.month()).or_default();
            entry.0 += 1;
            entry.1.push(name.clone());
        }
    }

    let mut plan: Vec<(u32, (u64, Vec<Value>))> = months.into_iter().collect();
    plan.sort_by(|(_, (a, _)), (_, (b, _))| b.cmp(a));
    plan.into_iter()
        .take(PLAN_MONTHS)
        .map(|(month, (starts, tours))| json!({"month": month, "numTourStarts": starts, "tours": tours}))
        .collect()
}
