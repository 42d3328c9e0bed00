mod extractor;

pub use extractor::{AuthUser, MaybeUser};
