pub mod comparator;
pub mod diff;
pub mod extract;
pub mod page;
pub mod selection;
pub mod vocabulary;

pub use comparator::Comparator;
pub use diff::{compare, Comparison, EntityAmenities, EntityReport};
pub use extract::extract_amenities;
pub use page::{HttpPageProvider, PageContent, PageContentProvider};
pub use selection::{Selection, SelectionEntry};
pub use vocabulary::VOCABULARY;
