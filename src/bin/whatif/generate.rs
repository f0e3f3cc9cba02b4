// Synthetic Baseline Generator: seedable, reproducible
// Produces a plausible order-line dataset when no real baseline is at hand

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use whatif_engine::{recompute, Direction, Row, RowId, RowSet, round2};

/// (category, sub-category, product prefix, list price range)
const CATALOG: [(&str, &str, &str, (f64, f64)); 6] = [
    ("Furniture", "Chairs", "FUR-CH", (80.0, 600.0)),
    ("Furniture", "Tables", "FUR-TA", (150.0, 1200.0)),
    ("Office Supplies", "Binders", "OFF-BI", (2.0, 60.0)),
    ("Office Supplies", "Paper", "OFF-PA", (3.0, 40.0)),
    ("Technology", "Phones", "TEC-PH", (40.0, 900.0)),
    ("Technology", "Accessories", "TEC-AC", (8.0, 250.0)),
];

/// (region, state, city, postal code)
const GEOGRAPHY: [(&str, &str, &str, &str); 6] = [
    ("West", "California", "Los Angeles", "90036"),
    ("West", "Washington", "Seattle", "98103"),
    ("East", "New York", "New York City", "10035"),
    ("East", "Pennsylvania", "Philadelphia", "19140"),
    ("Central", "Texas", "Houston", "77095"),
    ("South", "Florida", "Miami", "33142"),
];

/// Discount tiers seen in practice.
const DISCOUNTS: [f64; 6] = [0.0, 0.0, 0.1, 0.2, 0.3, 0.5];

/// Products per sub-category.
const PRODUCTS_PER_LINE: u32 = 8;

pub fn synthetic_baseline(rows: usize, seed: u64) -> RowSet {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut out = Vec::with_capacity(rows);

    for i in 0..rows {
        let (category, sub_category, prefix, (lo, hi)) = CATALOG[rng.gen_range(0..CATALOG.len())];
        let (region, state, city, postal) = GEOGRAPHY[rng.gen_range(0..GEOGRAPHY.len())];
        let product_no = rng.gen_range(0..PRODUCTS_PER_LINE);

        // price is a property of the product, so derive it from the product number
        let list_price = round2(lo + (hi - lo) * (product_no as f64 + 0.5) / PRODUCTS_PER_LINE as f64);
        let cost_ratio = rng.gen_range(0.45..0.85);

        out.push(Row {
            row_id: RowId::from((i + 1).to_string()),
            order_year: rng.gen_range(2014..=2017),
            order_month: rng.gen_range(1..=12),
            category: category.to_string(),
            sub_category: sub_category.to_string(),
            product_id: format!("{prefix}-{:08}", 10_000_000 + product_no),
            region: region.to_string(),
            state: state.to_string(),
            city: city.to_string(),
            postal_code: postal.to_string(),
            list_price,
            discount: *DISCOUNTS.choose(&mut rng).unwrap_or(&0.0),
            quantity: rng.gen_range(1..=9),
            cogs: round2(list_price * cost_ratio),
            net_price: f64::NAN,
            sales: f64::NAN,
            profit: f64::NAN,
            gross_margin: f64::NAN,
        });
    }

    recompute(&mut out, Direction::ProfitDriven);
    RowSet::try_from(out).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_data() {
        let a = synthetic_baseline(50, 7);
        let b = synthetic_baseline(50, 7);
        assert_eq!(a, b);
        assert_eq!(a.len(), 50);
        assert!(a.iter().all(|r| r.is_defined() && r.quantity > 0));
    }
}
