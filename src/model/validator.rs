//! @ai:module:intent Local feasibility checks for solutions
//! @ai:module:layer domain
//! @ai:module:public_api SolutionValidator, FeasibilityValidator, ValidationOutcome
//! @ai:module:stateless true

use crate::model::instance::Instance;
use crate::model::solution::{Solution, VehicleRoute};

/// Absolute tolerance on quantities and costs.
const TOLERANCE: f64 = 1e-6;

/// @ai:intent Result of a local feasibility check
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationOutcome {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

impl ValidationOutcome {
    /// @ai:intent Build an outcome from collected violations
    /// @ai:effects pure
    pub fn from_errors(errors: Vec<String>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }
}

/// @ai:intent Trait for checking a solution against its instance
pub trait SolutionValidator: Send + Sync {
    /// @ai:intent Return all constraint violations of `solution`
    fn validate(&self, instance: &Instance, solution: &Solution) -> ValidationOutcome;
}

/// @ai:intent Checks capacities, stocks, demand coverage and cost consistency
pub struct FeasibilityValidator;

impl FeasibilityValidator {
    /// @ai:intent Create a new validator
    /// @ai:effects pure
    pub fn new() -> Self {
        Self
    }

    /// @ai:intent Check that every index in a route refers to an existing entity
    /// @ai:effects pure
    fn check_references(instance: &Instance, route: &VehicleRoute, errors: &mut Vec<String>) -> bool {
        if route.vehicle >= instance.vehicles.len() {
            errors.push(format!("Route refers to unknown vehicle index {}", route.vehicle));
            return false;
        }

        let vehicle_id = instance.vehicles[route.vehicle].id;
        let before = errors.len();

        for (t, trip) in route.trips.iter().enumerate() {
            if trip.product >= instance.nb_products {
                errors.push(format!("Vehicle {vehicle_id}, trip {}: unknown product {}", t + 1, trip.product + 1));
            }
            if trip.depot >= instance.depots.len() {
                errors.push(format!("Vehicle {vehicle_id}, trip {}: unknown depot index {}", t + 1, trip.depot));
            }
            for delivery in &trip.deliveries {
                if delivery.station >= instance.stations.len() {
                    errors.push(format!(
                        "Vehicle {vehicle_id}, trip {}: unknown station index {}",
                        t + 1,
                        delivery.station
                    ));
                }
            }
        }

        errors.len() == before
    }

    /// @ai:intent Check loads against capacity and deliveries against loads
    /// @ai:effects pure
    fn check_loads(instance: &Instance, route: &VehicleRoute, errors: &mut Vec<String>) {
        let vehicle = &instance.vehicles[route.vehicle];

        for (t, trip) in route.trips.iter().enumerate() {
            if trip.load > vehicle.capacity + TOLERANCE {
                errors.push(format!(
                    "Vehicle {}, trip {}: load {:.2} exceeds capacity {:.2}",
                    vehicle.id,
                    t + 1,
                    trip.load,
                    vehicle.capacity
                ));
            }

            let delivered: f64 = trip.deliveries.iter().map(|d| d.quantity).sum();
            if (delivered - trip.load).abs() > TOLERANCE {
                errors.push(format!(
                    "Vehicle {}, trip {}: delivered {:.2} but loaded {:.2}",
                    vehicle.id,
                    t + 1,
                    delivered,
                    trip.load
                ));
            }

            if trip.deliveries.iter().any(|d| d.quantity <= 0.0) {
                errors.push(format!("Vehicle {}, trip {}: non-positive delivery", vehicle.id, t + 1));
            }
        }
    }

    /// @ai:intent Check that stored route costs match the route geometry
    /// @ai:effects pure
    fn check_costs(instance: &Instance, route: &VehicleRoute, errors: &mut Vec<String>) {
        let expected = VehicleRoute::evaluate(instance, route.vehicle, &route.trips);
        let vehicle_id = instance.vehicles[route.vehicle].id;

        if (expected.distance - route.costs.distance).abs() > TOLERANCE {
            errors.push(format!(
                "Vehicle {vehicle_id}: reported distance {:.2} differs from computed {:.2}",
                route.costs.distance, expected.distance
            ));
        }
        if (expected.transition_cost - route.costs.transition_cost).abs() > TOLERANCE
            || expected.transitions != route.costs.transitions
        {
            errors.push(format!(
                "Vehicle {vehicle_id}: reported changeover cost {:.2} differs from computed {:.2}",
                route.costs.transition_cost, expected.transition_cost
            ));
        }
    }
}

impl Default for FeasibilityValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl SolutionValidator for FeasibilityValidator {
    /// @ai:intent Validate a solution; errors are reported in discovery order
    /// @ai:effects pure
    fn validate(&self, instance: &Instance, solution: &Solution) -> ValidationOutcome {
        let mut errors = Vec::new();
        let mut served = vec![vec![0.0; instance.nb_products]; instance.stations.len()];
        let mut taken = vec![vec![0.0; instance.nb_products]; instance.depots.len()];

        for route in &solution.routes {
            if !Self::check_references(instance, route, &mut errors) {
                continue;
            }

            Self::check_loads(instance, route, &mut errors);
            Self::check_costs(instance, route, &mut errors);

            for trip in &route.trips {
                taken[trip.depot][trip.product] += trip.load;
                for delivery in &trip.deliveries {
                    served[delivery.station][trip.product] += delivery.quantity;
                }
            }
        }

        for (depot, used) in instance.depots.iter().zip(&taken) {
            for p in 0..instance.nb_products {
                if used[p] > depot.stock[p] + TOLERANCE {
                    errors.push(format!(
                        "Depot {}: product {} loaded {:.2} exceeds stock {:.2}",
                        depot.id,
                        p + 1,
                        used[p],
                        depot.stock[p]
                    ));
                }
            }
        }

        for (station, got) in instance.stations.iter().zip(&served) {
            for p in 0..instance.nb_products {
                if (got[p] - station.demand[p]).abs() > TOLERANCE {
                    errors.push(format!(
                        "Station {}: product {} received {:.2}, demand {:.2}",
                        station.id,
                        p + 1,
                        got[p],
                        station.demand[p]
                    ));
                }
            }
        }

        ValidationOutcome::from_errors(errors)
    }
}
