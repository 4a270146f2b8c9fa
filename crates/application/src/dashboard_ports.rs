mod approval;
mod assignment;
mod collection;
mod identity;
mod preference;

pub use approval::ApprovalGateway;
pub use assignment::AssignmentGateway;
pub use collection::{CollectionSource, FullCollectionSource};
pub use identity::{IdentityGateway, TokenProvider};
pub use preference::PreferenceStore;
