//! Seed the catalog from a YAML file.
//!
//! The file is a list of products:
//!
//! ```yaml
//! - id: 1
//!   kind: event
//!   title: Diwali Lamp Lighting
//!   price: "11.00"
//!   currency: USD
//!   stock: 40
//!   starts_at: 2026-11-08T18:00:00Z
//! - id: 2
//!   kind: plan
//!   title: Monthly Archana
//!   price: "25.00"
//!   stock: 100
//! ```
//!
//! Existing products with the same ID are updated. With `--replace`, every
//! product missing from the file is deactivated.

use std::collections::HashSet;
use std::path::Path;

use rust_decimal::Decimal;
use tracing::{error, info};

use temple_pos_core::ProductId;
use temple_pos_storefront::db::{self, CatalogRepository, catalog::NewProduct};

use super::{CommandError, database_url};

/// Validate a parsed catalog file, returning one message per problem.
#[must_use]
pub fn validate(products: &[NewProduct]) -> Vec<String> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for product in products {
        if !seen.insert(product.id) {
            errors.push(format!("product {}: duplicate id", product.id));
        }
        if product.title.trim().is_empty() {
            errors.push(format!("product {}: title is empty", product.id));
        }
        if product.price < Decimal::ZERO {
            errors.push(format!(
                "product {}: negative price {}",
                product.id, product.price
            ));
        }
        if product.image_url.as_deref().is_some_and(str::is_empty) {
            errors.push(format!("product {}: image_url is empty", product.id));
        }
    }

    errors
}

/// Seed catalog products from `file_path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, validation fails,
/// or database operations fail.
pub async fn catalog(file_path: &Path, replace: bool) -> Result<(), CommandError> {
    info!(path = %file_path.display(), "Loading catalog from file");

    // Read and validate YAML before connecting to database
    let content = tokio::fs::read_to_string(file_path)
        .await
        .map_err(|source| CommandError::Read {
            path: file_path.display().to_string(),
            source,
        })?;
    let products: Vec<NewProduct> = serde_yaml::from_str(&content)?;
    info!(products = products.len(), "Parsed catalog");

    let errors = validate(&products);
    if !errors.is_empty() {
        error!("Catalog validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(CommandError::Validation(errors.len()));
    }

    let pool = db::create_pool(&database_url()?).await?;
    let repo = CatalogRepository::new(pool);

    for product in &products {
        repo.upsert(product).await?;
    }
    info!(upserted = products.len(), "Catalog products written");

    if replace {
        let keep: Vec<ProductId> = products.iter().map(|p| p.id).collect();
        let deactivated = repo.deactivate_except(&keep).await?;
        info!(deactivated, "Deactivated products missing from file");
    }

    info!("Seeding complete!");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> Vec<NewProduct> {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_valid_catalog() {
        let products = parse(
            r#"
- id: 1
  kind: event
  title: Diwali Lamp Lighting
  price: "11.00"
  stock: 40
  starts_at: 2026-11-08T18:00:00Z
- id: 2
  kind: plan
  title: Monthly Archana
  price: "25.00"
  currency: USD
  stock: 100
"#,
        );
        assert_eq!(products.len(), 2);
        assert!(validate(&products).is_empty());
    }

    #[test]
    fn test_reports_every_problem() {
        let products = parse(
            r#"
- id: 1
  kind: event
  title: "  "
  price: "-1"
  stock: 1
- id: 1
  kind: plan
  title: Duplicate
  price: "5"
  stock: 1
  image_url: ""
"#,
        );
        let errors = validate(&products);
        assert_eq!(errors.len(), 4, "{errors:?}");
        assert!(errors.iter().any(|e| e.contains("duplicate id")));
        assert!(errors.iter().any(|e| e.contains("negative price")));
    }

    #[test]
    fn test_rejects_unknown_kind() {
        let result: Result<Vec<NewProduct>, _> = serde_yaml::from_str(
            r#"
- id: 1
  kind: donation
  title: Gift
  price: "5"
  stock: 1
"#,
        );
        assert!(result.is_err());
    }
}
