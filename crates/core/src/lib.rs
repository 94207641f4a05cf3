pub mod config;
pub mod domain;
pub mod entitlements;
pub mod errors;
pub mod pricing;
pub mod registry;
pub mod session;

pub use domain::plan::PlanTier;
pub use domain::report::{normalize_report, CoverageResult, CoverageStatus};
pub use domain::user::UserProfile;
pub use entitlements::catalog::{EntitlementCatalog, PaidReports, TierEntitlements};
pub use entitlements::resolver::EntitlementResolver;
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use pricing::PricingTable;
pub use registry::UserRegistry;
pub use session::SessionStore;
