//! @ai:module:intent Constructive solver for MPVRP-CC instances
//! @ai:module:layer domain
//! @ai:module:public_api Solver, GreedySolver
//! @ai:module:stateless true

use crate::error::ModelError;
use crate::model::instance::{Instance, Point};
use crate::model::solution::{Delivery, Solution, Trip, VehicleRoute};

/// Quantities below this are treated as zero.
pub(crate) const QUANTITY_EPSILON: f64 = 1e-9;

/// @ai:intent Trait for producing a candidate solution from an instance
pub trait Solver: Send + Sync {
    /// @ai:intent Solve `instance`, trading distance against changeover cost with `changeover_weight`
    fn solve(&self, instance: &Instance, changeover_weight: f64) -> Result<Solution, ModelError>;
}

/// @ai:intent Deterministic greedy construction: least-loaded vehicle, best-scored product, nearest stations
pub struct GreedySolver;

/// @ai:intent Mutable per-vehicle state during construction
struct VehicleState {
    position: Point,
    product: usize,
    travelled: f64,
    trips: Vec<Trip>,
}

impl GreedySolver {
    /// @ai:intent Create a new greedy solver
    /// @ai:effects pure
    pub fn new() -> Self {
        Self
    }

    /// @ai:intent Nearest depot to `from` that still stocks `product`
    /// @ai:effects pure
    fn nearest_depot(instance: &Instance, stock: &[Vec<f64>], from: &Point, product: usize) -> Option<(usize, f64)> {
        instance
            .depots
            .iter()
            .enumerate()
            .filter(|(d, _)| stock[*d][product] > QUANTITY_EPSILON)
            .map(|(d, depot)| (d, from.distance(&depot.location)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    /// @ai:intent Nearest station to `from` with remaining demand of `product`
    /// @ai:effects pure
    fn nearest_station(instance: &Instance, remaining: &[Vec<f64>], from: &Point, product: usize) -> Option<usize> {
        instance
            .stations
            .iter()
            .enumerate()
            .filter(|(s, _)| remaining[*s][product] > QUANTITY_EPSILON)
            .map(|(s, station)| (s, from.distance(&station.location)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(s, _)| s)
    }
}

impl Default for GreedySolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Solver for GreedySolver {
    /// @ai:intent Build routes until every station demand is served
    /// @ai:pre 0 <= changeover_weight <= 1
    /// @ai:effects pure
    fn solve(&self, instance: &Instance, changeover_weight: f64) -> Result<Solution, ModelError> {
        if !(0.0..=1.0).contains(&changeover_weight) {
            return Err(ModelError::Solver(format!(
                "changeover weight must be within [0, 1], got {changeover_weight}"
            )));
        }

        let mut remaining: Vec<Vec<f64>> = instance.stations.iter().map(|s| s.demand.clone()).collect();
        let mut stock: Vec<Vec<f64>> = instance.depots.iter().map(|d| d.stock.clone()).collect();
        let mut demand_left: Vec<f64> = (0..instance.nb_products).map(|p| instance.total_demand(p)).collect();
        if demand_left.iter().any(|d| !d.is_finite()) {
            return Err(ModelError::Solver("station demands must be finite".to_string()));
        }

        let mut states: Vec<VehicleState> = instance
            .vehicles
            .iter()
            .map(|v| VehicleState {
                position: instance.garages[v.garage].location,
                product: v.initial_product,
                travelled: 0.0,
                trips: Vec::new(),
            })
            .collect();

        while demand_left.iter().any(|d| *d > QUANTITY_EPSILON) {
            let vehicle = instance
                .vehicles
                .iter()
                .enumerate()
                .filter(|(_, v)| v.capacity > QUANTITY_EPSILON)
                .min_by(|a, b| states[a.0].travelled.total_cmp(&states[b.0].travelled))
                .map(|(i, _)| i)
                .ok_or_else(|| ModelError::Solver("no vehicle has a positive capacity".to_string()))?;

            let state = &states[vehicle];

            let choice = (0..instance.nb_products)
                .filter(|p| demand_left[*p] > QUANTITY_EPSILON)
                .filter_map(|p| {
                    Self::nearest_depot(instance, &stock, &state.position, p).map(|(depot, distance)| {
                        let score = (1.0 - changeover_weight) * distance
                            + changeover_weight * instance.transition_cost(state.product, p);
                        (p, depot, score)
                    })
                })
                .min_by(|a, b| a.2.total_cmp(&b.2));

            let (product, depot, _) = choice.ok_or_else(|| {
                let missing = (0..instance.nb_products)
                    .filter(|p| demand_left[*p] > QUANTITY_EPSILON)
                    .map(|p| (p + 1).to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                ModelError::Solver(format!("depots are out of stock for product(s) {missing}"))
            })?;

            let load = instance.vehicles[vehicle]
                .capacity
                .min(demand_left[product])
                .min(stock[depot][product]);
            stock[depot][product] -= load;
            demand_left[product] -= load;

            let state = &mut states[vehicle];
            let depot_location = instance.depots[depot].location;
            state.travelled += state.position.distance(&depot_location);
            state.position = depot_location;

            let mut left = load;
            let mut deliveries = Vec::new();

            while left > QUANTITY_EPSILON {
                let Some(station) = Self::nearest_station(instance, &remaining, &state.position, product) else {
                    break;
                };
                let quantity = left.min(remaining[station][product]);
                remaining[station][product] -= quantity;
                left -= quantity;

                let location = instance.stations[station].location;
                state.travelled += state.position.distance(&location);
                state.position = location;
                deliveries.push(Delivery { station, quantity });
            }

            state.product = product;
            state.trips.push(Trip {
                product,
                depot,
                load,
                deliveries,
            });
        }

        let routes = states
            .into_iter()
            .enumerate()
            .map(|(vehicle, state)| VehicleRoute::new(instance, vehicle, state.trips))
            .collect();

        Ok(Solution {
            instance_name: instance.name.clone(),
            routes,
        })
    }
}
