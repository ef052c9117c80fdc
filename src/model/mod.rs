//! @ai:module:intent MPVRP-CC problem model and the pipeline's default collaborators
//! @ai:module:layer domain
//! @ai:module:public_api Instance, InstanceDescriptor, Solution, InstanceParser, Solver, SolutionValidator, SolutionWriter

pub mod instance;
pub mod solution;
pub mod solver;
pub mod validator;
pub mod writer;

pub use instance::{DatParser, Depot, Garage, Instance, InstanceDescriptor, InstanceParser, Point, Station, Vehicle};
pub use solution::{Delivery, RouteCosts, Solution, Trip, VehicleRoute};
pub use solver::{GreedySolver, Solver};
pub use validator::{FeasibilityValidator, SolutionValidator, ValidationOutcome};
pub use writer::{solution_file_name, DatSolutionWriter, SolutionWriter};
