pub mod error;
pub use error::Result;
pub use error::Error;
pub use error::ErrorKind;

pub mod config;
pub use config::Config;

pub mod bundles;
pub use bundles::Bundle;
pub use bundles::BundleStore;

pub mod requirements;
pub use requirements::RequirementIndex;

pub mod relation_graph;
pub use relation_graph::RelationGraph;
pub use relation_graph::NodeId;

pub mod closure;

pub mod resolver;
pub use resolver::ClosureResolver;
pub use resolver::ResolverBuilder;
pub use resolver::Mode;
