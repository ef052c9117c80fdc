//! @ai:module:intent Solution representation and its cost accessors
//! @ai:module:layer domain
//! @ai:module:public_api Solution, VehicleRoute, Trip, Delivery, RouteCosts
//! @ai:module:stateless true

use crate::model::instance::Instance;

/// @ai:intent Quantity dropped at a station (0-based station index)
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub station: usize,
    pub quantity: f64,
}

/// @ai:intent One load of a single product at a depot followed by its deliveries
#[derive(Debug, Clone, PartialEq)]
pub struct Trip {
    pub product: usize,
    pub depot: usize,
    pub load: f64,
    pub deliveries: Vec<Delivery>,
}

/// @ai:intent Costs derived from a route's geometry and product sequence
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RouteCosts {
    pub distance: f64,
    pub transition_cost: f64,
    pub transitions: usize,
}

/// @ai:intent Ordered trips of one vehicle, from its garage back to its garage
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleRoute {
    pub vehicle: usize,
    pub trips: Vec<Trip>,
    pub costs: RouteCosts,
}

impl VehicleRoute {
    /// @ai:intent Build a route and compute its costs against the instance
    /// @ai:pre all indices in `trips` are valid for `instance`
    /// @ai:effects pure
    pub fn new(instance: &Instance, vehicle: usize, trips: Vec<Trip>) -> Self {
        let costs = Self::evaluate(instance, vehicle, &trips);
        Self {
            vehicle,
            trips,
            costs,
        }
    }

    /// @ai:intent Compute distance and changeover costs of a trip sequence
    /// @ai:pre all indices are valid for `instance`
    /// @ai:effects pure
    pub fn evaluate(instance: &Instance, vehicle: usize, trips: &[Trip]) -> RouteCosts {
        if trips.is_empty() {
            return RouteCosts::default();
        }

        let info = &instance.vehicles[vehicle];
        let garage = instance.garages[info.garage].location;

        let mut costs = RouteCosts::default();
        let mut position = garage;
        let mut product = info.initial_product;

        for trip in trips {
            if trip.product != product {
                costs.transitions += 1;
                costs.transition_cost += instance.transition_cost(product, trip.product);
                product = trip.product;
            }

            let depot = instance.depots[trip.depot].location;
            costs.distance += position.distance(&depot);
            position = depot;

            for delivery in &trip.deliveries {
                let station = instance.stations[delivery.station].location;
                costs.distance += position.distance(&station);
                position = station;
            }
        }

        costs.distance += position.distance(&garage);
        costs
    }

    /// @ai:intent Whether the vehicle leaves its garage at all
    /// @ai:effects pure
    pub fn is_used(&self) -> bool {
        !self.trips.is_empty()
    }
}

/// @ai:intent Complete answer to an instance: one route per vehicle
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    pub instance_name: String,
    pub routes: Vec<VehicleRoute>,
}

impl Solution {
    /// @ai:intent Sum of route distances
    /// @ai:effects pure
    pub fn total_distance(&self) -> f64 {
        self.routes.iter().fold(0.0, |total, r| total + r.costs.distance)
    }

    /// @ai:intent Sum of product changeover costs
    /// @ai:effects pure
    pub fn total_transition_cost(&self) -> f64 {
        self.routes.iter().fold(0.0, |total, r| total + r.costs.transition_cost)
    }

    /// @ai:intent Objective value: distance plus changeover cost
    /// @ai:effects pure
    pub fn total_cost(&self) -> f64 {
        self.total_distance() + self.total_transition_cost()
    }

    /// @ai:intent Number of vehicles with at least one trip
    /// @ai:effects pure
    pub fn nb_vehicles_used(&self) -> usize {
        self.routes.iter().filter(|r| r.is_used()).count()
    }

    /// @ai:intent Number of product changes over all vehicles
    /// @ai:effects pure
    pub fn total_transitions(&self) -> usize {
        self.routes.iter().map(|r| r.costs.transitions).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::instance::{DatParser, SAMPLE_INSTANCE};
    use std::path::Path;

    fn sample() -> Instance {
        DatParser::new()
            .parse_str(Path::new("sample.dat"), SAMPLE_INSTANCE)
            .unwrap()
    }

    #[test]
    fn test_empty_route_costs_nothing() {
        let instance = sample();
        let route = VehicleRoute::new(&instance, 0, vec![]);
        assert!(!route.is_used());
        assert_eq!(route.costs, RouteCosts::default());
    }

    #[test]
    fn test_empty_solution_totals_are_positive_zero() {
        let solution = Solution {
            instance_name: "empty.dat".to_string(),
            routes: vec![],
        };

        assert!(solution.total_distance().is_sign_positive());
        assert!(solution.total_transition_cost().is_sign_positive());
        assert_eq!(format!("{:.2}", solution.total_cost()), "0.00");
    }

    #[test]
    fn test_route_costs() {
        let instance = sample();
        // vehicle 1 starts with product 0, loads product 1 at the depot and serves station 3
        let trips = vec![Trip {
            product: 1,
            depot: 0,
            load: 40.0,
            deliveries: vec![Delivery {
                station: 2,
                quantity: 40.0,
            }],
        }];
        let route = VehicleRoute::new(&instance, 0, trips);

        // garage (10,10) -> depot (0,0) -> station (0,5) -> garage (10,10)
        let expected = 200f64.sqrt() + 5.0 + 125f64.sqrt();
        assert!((route.costs.distance - expected).abs() < 1e-9);
        assert_eq!(route.costs.transitions, 1);
        assert!((route.costs.transition_cost - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_solution_totals() {
        let instance = sample();
        let trip = |product, station, quantity| Trip {
            product,
            depot: 0,
            load: quantity,
            deliveries: vec![Delivery { station, quantity }],
        };

        let solution = Solution {
            instance_name: instance.name.clone(),
            routes: vec![
                VehicleRoute::new(&instance, 0, vec![trip(0, 0, 50.0), trip(1, 2, 40.0)]),
                VehicleRoute::new(&instance, 1, vec![]),
            ],
        };

        assert_eq!(solution.nb_vehicles_used(), 1);
        assert_eq!(solution.total_transitions(), 1);
        assert!((solution.total_transition_cost() - 10.0).abs() < 1e-9);
        assert!(
            (solution.total_cost() - (solution.total_distance() + solution.total_transition_cost()))
                .abs()
                < 1e-9
        );
    }
}
