//! @ai:module:intent Serialize solutions to the `.dat` solution format
//! @ai:module:layer infrastructure
//! @ai:module:public_api SolutionWriter, DatSolutionWriter, solution_file_name
//! @ai:module:stateless true

use crate::error::ModelError;
use crate::model::instance::Instance;
use crate::model::solution::Solution;
use std::fmt::Write as FmtWrite;
use std::path::Path;
use std::time::Duration;

/// @ai:intent Output file name for the solution of an instance file
/// @ai:effects pure
pub fn solution_file_name(instance_file_name: &str) -> String {
    format!("Sol_{instance_file_name}")
}

/// @ai:intent Trait for persisting a solution
pub trait SolutionWriter: Send + Sync {
    /// @ai:intent Write `solution` to `path`, replacing any previous file
    fn write(
        &self,
        instance: &Instance,
        solution: &Solution,
        solve_time: Duration,
        path: &Path,
    ) -> Result<(), ModelError>;
}

/// @ai:intent Writes one route line and one product line per used vehicle, then a metrics footer
pub struct DatSolutionWriter;

impl DatSolutionWriter {
    /// @ai:intent Create a new solution writer
    /// @ai:effects pure
    pub fn new() -> Self {
        Self
    }

    /// @ai:intent Render the solution text
    /// @ai:effects pure
    pub fn render(&self, instance: &Instance, solution: &Solution, solve_time: Duration) -> String {
        let mut output = String::new();

        for route in solution.routes.iter().filter(|r| r.is_used()) {
            let vehicle = &instance.vehicles[route.vehicle];
            let garage_id = instance.garages[vehicle.garage].id;

            let mut nodes = vec![garage_id.to_string()];
            let mut products = vec![format!("{}(0.0)", vehicle.initial_product + 1)];
            let mut current = vehicle.initial_product;
            let mut cumulative = 0.0;

            for trip in &route.trips {
                if trip.product != current {
                    cumulative += instance.transition_cost(current, trip.product);
                    current = trip.product;
                }

                nodes.push(format!(
                    "{} [{}]",
                    instance.depots[trip.depot].id,
                    format_quantity(trip.load)
                ));
                products.push(format!("{}({:.1})", trip.product + 1, cumulative));

                for delivery in &trip.deliveries {
                    nodes.push(format!(
                        "{} ({})",
                        instance.stations[delivery.station].id,
                        format_quantity(delivery.quantity)
                    ));
                    products.push(format!("{}({:.1})", trip.product + 1, cumulative));
                }
            }

            nodes.push(garage_id.to_string());
            products.push(format!("{}({:.1})", current + 1, cumulative));

            writeln!(output, "{}: {}", vehicle.id, nodes.join(" - ")).unwrap();
            writeln!(output, "{}: {}", vehicle.id, products.join(" - ")).unwrap();
            writeln!(output).unwrap();
        }

        writeln!(output, "{}", solution.nb_vehicles_used()).unwrap();
        writeln!(output, "{}", solution.total_transitions()).unwrap();
        writeln!(output, "{:.2}", solution.total_transition_cost()).unwrap();
        writeln!(output, "{:.2}", solution.total_distance()).unwrap();
        writeln!(
            output,
            "{}-{}",
            std::env::consts::OS,
            std::env::consts::ARCH
        )
        .unwrap();
        writeln!(output, "{:.3}", solve_time.as_secs_f64()).unwrap();

        output
    }
}

impl Default for DatSolutionWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl SolutionWriter for DatSolutionWriter {
    /// @ai:intent Render and write the solution file
    /// @ai:effects fs:write
    fn write(
        &self,
        instance: &Instance,
        solution: &Solution,
        solve_time: Duration,
        path: &Path,
    ) -> Result<(), ModelError> {
        let content = self.render(instance, solution, solve_time);
        std::fs::write(path, content).map_err(|source| ModelError::FileWrite {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// @ai:intent Print integral quantities without a fractional part
/// @ai:effects pure
fn format_quantity(value: f64) -> String {
    if value.fract().abs() < 1e-9 {
        format!("{}", value.round() as i64)
    } else {
        format!("{value:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::instance::{DatParser, SAMPLE_INSTANCE};
    use crate::model::solution::{Delivery, Trip, VehicleRoute};
    use tempfile::TempDir;

    fn sample() -> Instance {
        DatParser::new()
            .parse_str(Path::new("sample.dat"), SAMPLE_INSTANCE)
            .unwrap()
    }

    #[test]
    fn test_solution_file_name() {
        assert_eq!(solution_file_name("MPVRP_S_001.dat"), "Sol_MPVRP_S_001.dat");
    }

    #[test]
    fn test_render_route_and_footer() {
        let instance = sample();
        let trips = vec![Trip {
            product: 1,
            depot: 0,
            load: 40.0,
            deliveries: vec![Delivery {
                station: 2,
                quantity: 40.0,
            }],
        }];
        let solution = Solution {
            instance_name: instance.name.clone(),
            routes: vec![
                VehicleRoute::new(&instance, 0, trips),
                VehicleRoute::new(&instance, 1, vec![]),
            ],
        };

        let text = DatSolutionWriter::new().render(&instance, &solution, Duration::from_millis(1500));
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "1: 1 - 1 [40] - 3 (40) - 1");
        assert_eq!(lines[1], "1: 1(0.0) - 2(10.0) - 2(10.0) - 2(10.0)");
        assert_eq!(lines[2], "");
        assert_eq!(lines[3], "1");
        assert_eq!(lines[4], "1");
        assert_eq!(lines[5], "10.00");
        assert_eq!(lines[6], format!("{:.2}", solution.total_distance()));
        assert_eq!(lines[8], "1.500");
    }

    #[test]
    fn test_write_overwrites_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("Sol_sample.dat");
        std::fs::write(&path, "stale").unwrap();

        let instance = sample();
        let solution = Solution {
            instance_name: instance.name.clone(),
            routes: vec![],
        };
        DatSolutionWriter::new()
            .write(&instance, &solution, Duration::ZERO, &path)
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(!content.contains("stale"));
        assert!(content.starts_with("0\n0\n0.00\n0.00\n"));
    }

    #[test]
    fn test_write_to_missing_directory_fails() {
        let instance = sample();
        let solution = Solution {
            instance_name: instance.name.clone(),
            routes: vec![],
        };
        let err = DatSolutionWriter::new()
            .write(&instance, &solution, Duration::ZERO, Path::new("/nonexistent/dir/Sol.dat"))
            .unwrap_err();
        assert!(matches!(err, ModelError::FileWrite { .. }));
    }

    #[test]
    fn test_format_quantity() {
        assert_eq!(format_quantity(1500.0), "1500");
        assert_eq!(format_quantity(12.5), "12.50");
    }
}
