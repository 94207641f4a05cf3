pub mod catalog;
pub mod resolver;

pub use catalog::{EntitlementCatalog, PaidReports, TierEntitlements};
pub use resolver::EntitlementResolver;
