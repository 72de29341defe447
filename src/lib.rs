//! Compile a JSON-Schema settings schema into a normalized type model, and
//! render it as documentation or as an example configuration file.
//!
//! ```no_run
//! use emmyrc_doc::{load_jsons, Loader};
//!
//! let registry = load_jsons("schemas/emmyrc.json".as_ref(), "EmmyRc")?;
//! let mut loader = Loader::new(registry);
//! let root = loader.load("EmmyRc")?;
//! println!("{}", root.print(Some(&loader), false));
//! # Ok::<(), emmyrc_doc::LoadError>(())
//! ```

pub mod error;
pub mod example;
pub mod ir;
pub mod loader;
pub mod norm;
pub mod print;
pub mod registry;
pub mod render;
pub mod sig;
pub mod uri;

pub use error::LoadError;
pub use example::{generate_example, render_example, ExampleKind};
pub use ir::{Kind, Meta, Ty};
pub use loader::{Loader, LoaderOptions};
pub use registry::{load_jsons, Registry};
pub use render::{document, AutoDocOptions, DocSink, Entry, EntryKind};
