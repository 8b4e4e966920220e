use serde::Deserialize;

use crate::models::load::{Load, LoadStatus};
use crate::models::truck::Truck;

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LoadSort {
    #[default]
    Newest,
    BudgetAsc,
    BudgetDesc,
    PickupDate,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoadQuery {
    pub status: Option<LoadStatus>,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub cargo_type: Option<String>,
    pub min_budget: Option<f64>,
    pub max_budget: Option<f64>,
    #[serde(default)]
    pub sort: LoadSort,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TruckSort {
    #[default]
    Newest,
    RateAsc,
    RateDesc,
    CapacityDesc,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TruckQuery {
    #[serde(default)]
    pub verified_only: bool,
    #[serde(default)]
    pub available_only: bool,
    pub truck_type: Option<String>,
    pub city: Option<String>,
    pub min_capacity_kg: Option<f64>,
    #[serde(default)]
    pub sort: TruckSort,
}

fn contains_ci(haystack: &str, needle: &Option<String>) -> bool {
    match needle.as_deref().map(str::trim) {
        None | Some("") => true,
        Some(needle) => haystack.to_lowercase().contains(&needle.to_lowercase()),
    }
}

fn equals_ci(value: &str, wanted: &Option<String>) -> bool {
    match wanted.as_deref().map(str::trim) {
        None | Some("") => true,
        Some(wanted) => value.eq_ignore_ascii_case(wanted),
    }
}

impl LoadQuery {
    pub fn matches(&self, load: &Load) -> bool {
        self.status.is_none_or(|status| load.status == status)
            && contains_ci(&load.origin, &self.origin)
            && contains_ci(&load.destination, &self.destination)
            && equals_ci(&load.cargo_type, &self.cargo_type)
            && self.min_budget.is_none_or(|min| load.budget >= min)
            && self.max_budget.is_none_or(|max| load.budget <= max)
    }
}

impl TruckQuery {
    pub fn matches(&self, truck: &Truck) -> bool {
        (!self.verified_only || truck.verified)
            && (!self.available_only || truck.available)
            && equals_ci(&truck.truck_type, &self.truck_type)
            && contains_ci(&truck.home_city, &self.city)
            && self.min_capacity_kg.is_none_or(|min| truck.capacity_kg >= min)
    }
}

/// Filters and orders loads. Entries are first put in creation order (ties
/// broken by id) and then stably sorted by the requested key, so records
/// with equal keys come back in the same order on every request.
pub fn select_loads(loads: impl IntoIterator<Item = Load>, query: &LoadQuery) -> Vec<Load> {
    let mut selected: Vec<Load> = loads.into_iter().filter(|l| query.matches(l)).collect();
    selected.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

    match query.sort {
        LoadSort::Newest => selected.reverse(),
        LoadSort::BudgetAsc => selected.sort_by(|a, b| a.budget.total_cmp(&b.budget)),
        LoadSort::BudgetDesc => selected.sort_by(|a, b| b.budget.total_cmp(&a.budget)),
        LoadSort::PickupDate => selected.sort_by(|a, b| a.pickup_date.cmp(&b.pickup_date)),
    }

    selected
}

pub fn select_trucks(trucks: impl IntoIterator<Item = Truck>, query: &TruckQuery) -> Vec<Truck> {
    let mut selected: Vec<Truck> = trucks.into_iter().filter(|t| query.matches(t)).collect();
    selected.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

    match query.sort {
        TruckSort::Newest => selected.reverse(),
        TruckSort::RateAsc => selected.sort_by(|a, b| a.rate_per_km.total_cmp(&b.rate_per_km)),
        TruckSort::RateDesc => selected.sort_by(|a, b| b.rate_per_km.total_cmp(&a.rate_per_km)),
        TruckSort::CapacityDesc => {
            selected.sort_by(|a, b| b.capacity_kg.total_cmp(&a.capacity_kg))
        }
    }

    selected
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate, Utc};
    use uuid::Uuid;

    use super::{select_loads, select_trucks, LoadQuery, LoadSort, TruckQuery, TruckSort};
    use crate::models::load::{Load, LoadStatus};
    use crate::models::truck::Truck;

    fn truck(seed: u128, rate: f64, verified: bool) -> Truck {
        Truck {
            id: Uuid::from_u128(seed),
            carrier_id: Uuid::from_u128(1000 + seed),
            registration: format!("LES-{seed:04}"),
            truck_type: if seed % 2 == 0 { "flatbed" } else { "container" }.to_string(),
            capacity_kg: 10_000.0 + seed as f64 * 1_000.0,
            rate_per_km: rate,
            home_city: if seed % 3 == 0 { "Lahore" } else { "Sost" }.to_string(),
            verified,
            available: true,
            created_at: Utc::now() + Duration::seconds(seed as i64),
        }
    }

    fn fleet() -> Vec<Truck> {
        (0..15u128)
            .map(|i| truck(i, [180.0, 150.0, 210.0][(i % 3) as usize], i % 4 != 0))
            .collect()
    }

    fn load(seed: u128, budget: f64) -> Load {
        Load {
            id: Uuid::from_u128(seed),
            shipper_id: Uuid::from_u128(1),
            origin: "Kashgar".to_string(),
            destination: if seed % 2 == 0 { "Gwadar" } else { "Karachi" }.to_string(),
            cargo_type: "Electronics".to_string(),
            weight_kg: 1_000.0,
            budget,
            currency: "PKR".to_string(),
            pickup_date: NaiveDate::from_ymd_opt(2026, 11, 1).unwrap(),
            delivery_date: NaiveDate::from_ymd_opt(2026, 11, 5).unwrap(),
            equipment: None,
            notes: None,
            status: LoadStatus::Available,
            created_at: Utc::now() + Duration::seconds(seed as i64),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn verified_only_returns_only_verified_trucks() {
        let query = TruckQuery {
            verified_only: true,
            ..TruckQuery::default()
        };

        let selected = select_trucks(fleet(), &query);

        let expected = fleet().iter().filter(|t| t.verified).count();
        assert_eq!(selected.len(), expected);
        assert_eq!(selected.len(), 11);
        assert!(selected.iter().all(|t| t.verified));
    }

    #[test]
    fn rate_ascending_keeps_ties_stable_across_sorts() {
        let query = TruckQuery {
            sort: TruckSort::RateAsc,
            ..TruckQuery::default()
        };

        let first: Vec<Uuid> = select_trucks(fleet(), &query).iter().map(|t| t.id).collect();

        let mut shuffled = fleet();
        shuffled.reverse();
        shuffled.rotate_left(4);
        let second: Vec<Uuid> = select_trucks(shuffled, &query).iter().map(|t| t.id).collect();

        assert_eq!(first, second);

        let rates: Vec<f64> = select_trucks(fleet(), &query)
            .iter()
            .map(|t| t.rate_per_km)
            .collect();
        assert!(rates.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn truck_filters_combine() {
        let query = TruckQuery {
            truck_type: Some("FLATBED".to_string()),
            city: Some("lah".to_string()),
            ..TruckQuery::default()
        };

        let selected = select_trucks(fleet(), &query);
        assert!(!selected.is_empty());
        assert!(selected
            .iter()
            .all(|t| t.truck_type == "flatbed" && t.home_city == "Lahore"));
    }

    #[test]
    fn loads_filter_by_destination_and_budget() {
        let loads = vec![load(1, 100.0), load(2, 200.0), load(3, 300.0), load(4, 400.0)];
        let query = LoadQuery {
            destination: Some("gwadar".to_string()),
            min_budget: Some(250.0),
            ..LoadQuery::default()
        };

        let selected = select_loads(loads, &query);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].id, Uuid::from_u128(4));
    }

    #[test]
    fn newest_first_by_default_and_budget_sort_is_stable() {
        let loads = vec![load(1, 200.0), load(2, 100.0), load(3, 200.0)];

        let newest = select_loads(loads.clone(), &LoadQuery::default());
        assert_eq!(newest[0].id, Uuid::from_u128(3));

        let query = LoadQuery {
            sort: LoadSort::BudgetAsc,
            ..LoadQuery::default()
        };
        let ids: Vec<u128> = select_loads(loads, &query)
            .iter()
            .map(|l| l.id.as_u128())
            .collect();
        assert_eq!(ids, vec![2, 1, 3]);
    }
}
