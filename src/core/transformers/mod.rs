mod refmap;

pub use refmap::{AddRefmapName, MixinConfigShape};
