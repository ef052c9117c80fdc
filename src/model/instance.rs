//! @ai:module:intent MPVRP-CC instance definitions and the `.dat` instance reader
//! @ai:module:layer domain
//! @ai:module:public_api Instance, InstanceDescriptor, InstanceParser, DatParser, Point, Vehicle, Depot, Garage, Station
//! @ai:module:stateless true

use crate::error::ModelError;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// @ai:intent Planar location
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// @ai:intent Euclidean distance to another point
    /// @ai:effects pure
    pub fn distance(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// @ai:intent Vehicle of the fleet; `garage` and `initial_product` are 0-based indices
#[derive(Debug, Clone, PartialEq)]
pub struct Vehicle {
    pub id: usize,
    pub capacity: f64,
    pub garage: usize,
    pub initial_product: usize,
}

/// @ai:intent Loading point with per-product stock
#[derive(Debug, Clone, PartialEq)]
pub struct Depot {
    pub id: usize,
    pub location: Point,
    pub stock: Vec<f64>,
}

/// @ai:intent Start and end point of vehicle routes
#[derive(Debug, Clone, PartialEq)]
pub struct Garage {
    pub id: usize,
    pub location: Point,
}

/// @ai:intent Customer with per-product demand
#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    pub id: usize,
    pub location: Point,
    pub demand: Vec<f64>,
}

/// @ai:intent Identity and size counters of a parsed instance
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceDescriptor {
    pub name: String,
    pub path: PathBuf,
    pub nb_stations: usize,
    pub nb_products: usize,
    pub nb_vehicles: usize,
}

/// @ai:intent Fully parsed problem instance
#[derive(Debug, Clone)]
pub struct Instance {
    pub name: String,
    pub path: PathBuf,
    pub nb_products: usize,
    /// Row = product carried before, column = product loaded next.
    pub transition_costs: Vec<Vec<f64>>,
    pub vehicles: Vec<Vehicle>,
    pub depots: Vec<Depot>,
    pub garages: Vec<Garage>,
    pub stations: Vec<Station>,
}

impl Instance {
    /// @ai:intent Build the descriptor consumed by the batch pipeline
    /// @ai:effects pure
    pub fn descriptor(&self) -> InstanceDescriptor {
        InstanceDescriptor {
            name: self.name.clone(),
            path: self.path.clone(),
            nb_stations: self.stations.len(),
            nb_products: self.nb_products,
            nb_vehicles: self.vehicles.len(),
        }
    }

    /// @ai:intent Changeover cost between two products
    /// @ai:effects pure
    pub fn transition_cost(&self, from: usize, to: usize) -> f64 {
        self.transition_costs[from][to]
    }

    /// @ai:intent Total demand for a product over all stations
    /// @ai:effects pure
    pub fn total_demand(&self, product: usize) -> f64 {
        self.stations.iter().fold(0.0, |total, s| total + s.demand[product])
    }
}

/// @ai:intent Trait for turning an instance file into an Instance
pub trait InstanceParser: Send + Sync {
    /// @ai:intent Parse the file at `path`
    fn parse(&self, path: &Path) -> Result<Instance, ModelError>;
}

/// @ai:intent Reader for the whitespace-separated `.dat` instance format
pub struct DatParser;

impl DatParser {
    /// @ai:intent Create a new instance reader
    /// @ai:effects pure
    pub fn new() -> Self {
        Self
    }

    /// @ai:intent Parse instance content already loaded in memory
    /// @ai:effects pure
    pub fn parse_str(&self, path: &Path, content: &str) -> Result<Instance, ModelError> {
        let mut records = Records::new(path, content);

        let (line, header) = records.next_record("header")?;
        let nb_products: usize = records.field(line, &header, 0, "nb_products")?;
        let nb_depots: usize = records.field(line, &header, 1, "nb_depots")?;
        let nb_garages: usize = records.field(line, &header, 2, "nb_garages")?;
        let nb_stations: usize = records.field(line, &header, 3, "nb_stations")?;
        let nb_vehicles: usize = records.field(line, &header, 4, "nb_vehicles")?;

        if nb_products == 0 {
            return Err(records.error(line, "instance declares no products"));
        }

        let mut transition_costs = Vec::with_capacity(nb_products);
        for _ in 0..nb_products {
            let (line, row) = records.next_record("transition cost row")?;
            records.expect_len(line, &row, nb_products, "transition cost row")?;
            let costs = (0..nb_products)
                .map(|i| records.number(line, &row, i, "transition cost"))
                .collect::<Result<Vec<_>, _>>()?;
            transition_costs.push(costs);
        }

        let mut raw_vehicles = Vec::with_capacity(nb_vehicles);
        for _ in 0..nb_vehicles {
            let (line, row) = records.next_record("vehicle")?;
            records.expect_len(line, &row, 4, "vehicle")?;
            let id: usize = records.field(line, &row, 0, "vehicle id")?;
            let capacity = records.number(line, &row, 1, "vehicle capacity")?;
            let garage_id: usize = records.field(line, &row, 2, "vehicle garage")?;
            let product: usize = records.field(line, &row, 3, "vehicle initial product")?;

            if product == 0 || product > nb_products {
                return Err(records.error(line, &format!("initial product {product} out of range")));
            }
            raw_vehicles.push((line, id, capacity, garage_id, product - 1));
        }

        let mut depots = Vec::with_capacity(nb_depots);
        for _ in 0..nb_depots {
            let (line, row) = records.next_record("depot")?;
            records.expect_len(line, &row, 3 + nb_products, "depot")?;
            depots.push(Depot {
                id: records.field(line, &row, 0, "depot id")?,
                location: records.point(line, &row, 1)?,
                stock: records.quantities(line, &row, 3, nb_products, "depot stock")?,
            });
        }

        let mut garages = Vec::with_capacity(nb_garages);
        for _ in 0..nb_garages {
            let (line, row) = records.next_record("garage")?;
            records.expect_len(line, &row, 3, "garage")?;
            garages.push(Garage {
                id: records.field(line, &row, 0, "garage id")?,
                location: records.point(line, &row, 1)?,
            });
        }

        let mut stations = Vec::with_capacity(nb_stations);
        for _ in 0..nb_stations {
            let (line, row) = records.next_record("station")?;
            records.expect_len(line, &row, 3 + nb_products, "station")?;
            stations.push(Station {
                id: records.field(line, &row, 0, "station id")?,
                location: records.point(line, &row, 1)?,
                demand: records.quantities(line, &row, 3, nb_products, "station demand")?,
            });
        }

        let vehicles = raw_vehicles
            .into_iter()
            .map(|(line, id, capacity, garage_id, initial_product)| {
                let garage = garages
                    .iter()
                    .position(|g| g.id == garage_id)
                    .ok_or_else(|| records.error(line, &format!("unknown garage {garage_id}")))?;
                Ok(Vehicle {
                    id,
                    capacity,
                    garage,
                    initial_product,
                })
            })
            .collect::<Result<Vec<_>, ModelError>>()?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Instance {
            name,
            path: path.to_path_buf(),
            nb_products,
            transition_costs,
            vehicles,
            depots,
            garages,
            stations,
        })
    }
}

impl Default for DatParser {
    fn default() -> Self {
        Self::new()
    }
}

impl InstanceParser for DatParser {
    /// @ai:intent Read and parse an instance file
    /// @ai:effects fs:read
    fn parse(&self, path: &Path) -> Result<Instance, ModelError> {
        let content = std::fs::read_to_string(path).map_err(|source| ModelError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        self.parse_str(path, &content)
    }
}

/// @ai:intent Cursor over meaningful lines, skipping blanks and `#` comments
struct Records<'a> {
    file: &'a Path,
    lines: std::iter::Enumerate<std::str::Lines<'a>>,
}

impl<'a> Records<'a> {
    fn new(file: &'a Path, content: &'a str) -> Self {
        Self {
            file,
            lines: content.lines().enumerate(),
        }
    }

    fn error(&self, line: usize, message: &str) -> ModelError {
        ModelError::Parse {
            file: self.file.to_path_buf(),
            line,
            message: message.to_string(),
        }
    }

    /// Returns the 1-based line number with its tokens.
    fn next_record(&mut self, what: &str) -> Result<(usize, Vec<&'a str>), ModelError> {
        for (index, raw) in self.lines.by_ref() {
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            return Ok((index + 1, trimmed.split_whitespace().collect()));
        }

        Err(ModelError::UnexpectedEof {
            file: self.file.to_path_buf(),
            message: format!("expected {what}"),
        })
    }

    fn expect_len(&self, line: usize, row: &[&str], len: usize, what: &str) -> Result<(), ModelError> {
        if row.len() < len {
            return Err(self.error(
                line,
                &format!("{what} expects {len} values, found {}", row.len()),
            ));
        }
        Ok(())
    }

    fn field<T: FromStr>(&self, line: usize, row: &[&str], index: usize, what: &str) -> Result<T, ModelError> {
        let token = row
            .get(index)
            .ok_or_else(|| self.error(line, &format!("missing {what}")))?;
        token
            .parse()
            .map_err(|_| self.error(line, &format!("invalid {what}: '{token}'")))
    }

    /// Numeric field; `inf` and `NaN` are rejected.
    fn number(&self, line: usize, row: &[&str], index: usize, what: &str) -> Result<f64, ModelError> {
        let value: f64 = self.field(line, row, index, what)?;
        if !value.is_finite() {
            return Err(self.error(line, &format!("{what} must be finite, got '{}'", row[index])));
        }
        Ok(value)
    }

    fn point(&self, line: usize, row: &[&str], start: usize) -> Result<Point, ModelError> {
        Ok(Point {
            x: self.number(line, row, start, "x coordinate")?,
            y: self.number(line, row, start + 1, "y coordinate")?,
        })
    }

    fn quantities(
        &self,
        line: usize,
        row: &[&str],
        start: usize,
        count: usize,
        what: &str,
    ) -> Result<Vec<f64>, ModelError> {
        (start..start + count)
            .map(|i| {
                let value = self.number(line, row, i, what)?;
                if value < 0.0 {
                    return Err(self.error(line, &format!("negative {what}")));
                }
                Ok(value)
            })
            .collect()
    }
}

/// Small two-product instance shared by the model tests.
#[cfg(test)]
pub(crate) const SAMPLE_INSTANCE: &str = "\
# sample instance
2 1 1 3 2

0 10
15 0

1 100 1 1
2 100 1 2

1 0 0 500 500

1 10 10

1 3 4 50 0
2 6 8 30 20
3 0 5 0 40
";

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> Result<Instance, ModelError> {
        DatParser::new().parse_str(Path::new("instances/MPVRP_test.dat"), content)
    }

    #[test]
    fn test_parse_sample_instance() {
        let instance = parse(SAMPLE_INSTANCE).unwrap();

        assert_eq!(instance.name, "MPVRP_test.dat");
        assert_eq!(instance.nb_products, 2);
        assert_eq!(instance.vehicles.len(), 2);
        assert_eq!(instance.depots.len(), 1);
        assert_eq!(instance.garages.len(), 1);
        assert_eq!(instance.stations.len(), 3);
        assert!((instance.transition_cost(1, 0) - 15.0).abs() < 1e-9);
        assert_eq!(instance.vehicles[1].initial_product, 1);
        assert_eq!(instance.vehicles[0].garage, 0);
        assert!((instance.total_demand(0) - 80.0).abs() < 1e-9);
        assert!((instance.total_demand(1) - 60.0).abs() < 1e-9);

        let descriptor = instance.descriptor();
        assert_eq!(descriptor.nb_stations, 3);
        assert_eq!(descriptor.nb_products, 2);
        assert_eq!(descriptor.nb_vehicles, 2);
    }

    #[test]
    fn test_truncated_file_reports_eof() {
        let err = parse("2 1 1 3 2\n0 10\n").unwrap_err();
        assert!(matches!(err, ModelError::UnexpectedEof { .. }));
    }

    #[test]
    fn test_invalid_number_reports_line() {
        let content = SAMPLE_INSTANCE.replace("1 100 1 1", "1 abc 1 1");
        match parse(&content).unwrap_err() {
            ModelError::Parse { line, message, .. } => {
                assert_eq!(line, 7);
                assert!(message.contains("vehicle capacity"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_non_finite_values_are_rejected() {
        let content = "1 1 1 1 1\n0\n1 10 1 1\n1 0 0 inf\n1 5 5\n1 3 4 inf\n";
        match parse(content).unwrap_err() {
            ModelError::Parse { line, message, .. } => {
                assert_eq!(line, 4);
                assert!(message.contains("depot stock must be finite"));
            }
            other => panic!("unexpected error: {other}"),
        }

        let content = SAMPLE_INSTANCE.replace("1 100 1 1", "1 NaN 1 1");
        let err = parse(&content).unwrap_err();
        assert!(err.to_string().contains("vehicle capacity must be finite"));

        let content = SAMPLE_INSTANCE.replace("0 10\n", "0 -inf\n");
        let err = parse(&content).unwrap_err();
        assert!(err.to_string().contains("transition cost must be finite"));
    }

    #[test]
    fn test_unknown_garage_is_rejected() {
        let content = SAMPLE_INSTANCE.replace("2 100 1 2", "2 100 9 2");
        let err = parse(&content).unwrap_err();
        assert!(err.to_string().contains("unknown garage 9"));
    }

    #[test]
    fn test_missing_file() {
        let err = DatParser::new()
            .parse(Path::new("/nonexistent/instance.dat"))
            .unwrap_err();
        assert!(matches!(err, ModelError::FileRead { .. }));
    }

    #[test]
    fn test_point_distance() {
        let a = Point { x: 0.0, y: 0.0 };
        let b = Point { x: 3.0, y: 4.0 };
        assert!((a.distance(&b) - 5.0).abs() < 1e-9);
    }
}
