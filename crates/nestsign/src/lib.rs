pub mod builder;
pub mod codesign;
pub mod discovery;
pub mod error;
pub mod inspect;
pub mod order;
pub mod target;

pub use builder::{NestSign, SignReport};
pub use codesign::{Codesign, SignTool};
pub use discovery::discover;
pub use error::{Error, SignFailure};
pub use inspect::{Inspector, Introspect, MachOInspector, Otool};
pub use order::{sign_all, signing_order};
pub use target::{classify, resolve_root, Target, TargetKind};

pub type Result<T> = std::result::Result<T, Error>;
