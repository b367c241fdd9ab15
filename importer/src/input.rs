//! The user describes what to download and how to draw it in small input files. Each file is a
//! list of records, either `{"layers": [{...}, ...]}` JSON or delimited text with a header line.
//! Keys are capitalized on load, so `name` and `Name` mean the same column.

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::{Map, Value};

use maputil::{capitalize, check_color, contains_duplicates, MAIN};

/// One layer to download.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerRequest {
    /// Unique within a batch; used as the cache file stem.
    pub name: String,
    /// An ohsome filter expression, like `amenity=bicycle_parking`
    pub filter: String,
    /// None means the API's default, the latest snapshot.
    pub time: Option<String>,
    /// Relative to the input directory
    pub polygon: String,
}

/// How to draw one layer.
#[derive(Clone, Debug, PartialEq)]
pub struct PlotSpec {
    pub name: String,
    /// Hex or a CSS color name
    pub color: String,
}

/// Why a batch of input records was rejected. Either way, the whole batch is refused.
#[derive(Clone, Debug, PartialEq)]
pub enum InputError {
    /// A column is missing, or the file isn't shaped like a list of records.
    Schema(String),
    /// The columns are there, but some value breaks a rule.
    Value(String),
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            InputError::Schema(msg) => write!(f, "wrong column names: {}", msg),
            InputError::Value(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for InputError {}

type Record = Map<String, Value>;

/// Reads an input file into JSON. `.csv` and `.txt` files are delimited text whose first line names
/// the columns; they're converted to the same `{"layers": [...]}` shape as the JSON inputs.
pub fn read_input_file<P: AsRef<Path>>(path: P) -> Result<Value> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());
    match ext.as_deref() {
        Some("csv") | Some("txt") => {
            let text = mapio::read_text(path)?;
            read_delimited(&text).with_context(|| format!("parsing {}", path.display()))
        }
        _ => Ok(mapio::read_json(path)?),
    }
}

fn read_delimited(text: &str) -> Result<Value> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());
    let headers = reader.headers()?.clone();
    let mut layers = Vec::new();
    for row in reader.records() {
        let row = row?;
        let mut record = Record::new();
        for (key, value) in headers.iter().zip(row.iter()) {
            record.insert(key.to_string(), Value::String(value.to_string()));
        }
        layers.push(Value::Object(record));
    }
    let mut top = Record::new();
    top.insert("layers".to_string(), Value::Array(layers));
    Ok(Value::Object(top))
}

fn records(input: &Value) -> Result<Vec<Record>, InputError> {
    let layers = input
        .get("layers")
        .and_then(|layers| layers.as_array())
        .ok_or_else(|| InputError::Schema("expected a \"layers\" list".to_string()))?;
    if layers.is_empty() {
        return Err(InputError::Schema("no layers given".to_string()));
    }
    layers
        .iter()
        .map(|layer| match layer {
            Value::Object(fields) => Ok(fields
                .iter()
                .map(|(key, value)| (capitalize(key), value.clone()))
                .collect()),
            _ => Err(InputError::Schema(format!(
                "every layer must be an object, not {}",
                layer
            ))),
        })
        .collect()
}

fn column<'a>(record: &'a Record, key: &str) -> Result<&'a Value, InputError> {
    record
        .get(key)
        .ok_or_else(|| InputError::Schema(format!("missing column {}", key)))
}

fn string_column(record: &Record, key: &str) -> Result<String, InputError> {
    match column(record, key)? {
        Value::String(x) => Ok(x.clone()),
        other => Err(InputError::Value(format!(
            "{} must be a string, not {}",
            key, other
        ))),
    }
}

fn check_unique_names<'a, I: Iterator<Item = &'a String>>(names: I) -> Result<(), InputError> {
    let names: Vec<&String> = names.collect();
    if let Some(name) = contains_duplicates(&names) {
        return Err(InputError::Value(format!(
            "the layer name {} is used more than once",
            name
        )));
    }
    Ok(())
}

/// Layer names become cache file names, so they must stay inside the data directory.
fn check_layer_name(name: &str) -> Result<(), InputError> {
    if name.trim().is_empty() {
        return Err(InputError::Value("a layer name can't be empty".to_string()));
    }
    if name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(InputError::Value(format!(
            "the layer name {} can't contain a path",
            name
        )));
    }
    Ok(())
}

pub fn parse_download_input(input: &Value) -> Result<Vec<LayerRequest>, InputError> {
    let mut requests = Vec::new();
    for record in records(input)? {
        let name = string_column(&record, "Name")?;
        check_layer_name(&name)?;
        let filter = string_column(&record, "Filter")?;
        if !filter.contains('=') {
            return Err(InputError::Value(format!(
                "{} is not a correct filter, requires at least one '='",
                filter
            )));
        }
        let time = match record.get("Time") {
            None | Some(Value::Null) => None,
            Some(Value::String(x)) if x == "None" || x.is_empty() => None,
            Some(Value::String(x)) => Some(x.clone()),
            Some(other) => {
                return Err(InputError::Value(format!(
                    "Time must be a string, not {}",
                    other
                )))
            }
        };
        let polygon = string_column(&record, "Polygon")?;
        if !mapio::is_vector_file(&polygon) {
            return Err(InputError::Value(format!(
                "the input polygon file {} should be of type .{}",
                polygon,
                mapio::VECTOR_EXTENSIONS.join(" or .")
            )));
        }
        requests.push(LayerRequest {
            name,
            filter,
            time,
            polygon,
        });
    }
    check_unique_names(requests.iter().map(|req| &req.name))?;
    Ok(requests)
}

pub fn parse_plotting_input(input: &Value) -> Result<Vec<PlotSpec>, InputError> {
    let mut specs = Vec::new();
    for record in records(input)? {
        let name = string_column(&record, "Name")?;
        check_layer_name(&name)?;
        let color = string_column(&record, "Color")?;
        if !check_color(&color) {
            return Err(InputError::Value(format!("color {} is not correct", color)));
        }
        specs.push(PlotSpec { name, color });
    }
    check_unique_names(specs.iter().map(|spec| &spec.name))?;
    Ok(specs)
}

/// True if the download input is usable. Otherwise logs why not.
pub fn check_download_input(input: &Value) -> bool {
    report("download", parse_download_input(input).map(|_| ()))
}

/// True if the plotting input is usable. Otherwise logs why not.
pub fn check_plotting_input(input: &Value) -> bool {
    report("plotting", parse_plotting_input(input).map(|_| ()))
}

fn report(what: &str, result: Result<(), InputError>) -> bool {
    match result {
        Ok(()) => true,
        Err(err) => {
            warn!("Given user {} input is not correct, {}", what, err);
            false
        }
    }
}

/// Every layer to be drawn must also be one that's downloaded.
pub fn cross_check(plots: &[PlotSpec], requests: &[LayerRequest]) -> Result<(), InputError> {
    for plot in plots {
        if !requests.iter().any(|req| req.name == plot.name) {
            return Err(InputError::Value(format!(
                "the plotted layer {} is not among the downloaded layers",
                plot.name
            )));
        }
    }
    let unstyled: Vec<&str> = requests
        .iter()
        .filter(|req| !plots.iter().any(|plot| plot.name == req.name))
        .map(|req| req.name.as_str())
        .collect();
    if !unstyled.is_empty() {
        info!(target: MAIN, "no style given for {}; these won't be drawn", unstyled.join(", "));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn download_input() -> Value {
        json!({
            "layers": [
                {
                    "name": "bicycle_parking",
                    "filter": "amenity=bicycle_parking and type:node",
                    "time": "None",
                    "polygon": "input_polygon.geojson"
                },
                {
                    "name": "highways",
                    "filter": "highway=* and type:way",
                    "time": "2021-01-01",
                    "polygon": "input_polygon.GeoJSON"
                },
                {
                    "name": "buildings",
                    "filter": "building=* and geometry:polygon",
                    "time": null,
                    "polygon": "polygons/heidelberg.fgb"
                }
            ]
        })
    }

    fn plotting_input() -> Value {
        json!({
            "layers": [
                { "name": "bicycle_parking", "color": "#00ff00" },
                { "name": "highways", "color": "#abc" },
                { "name": "buildings", "color": "lightgrey" }
            ]
        })
    }

    fn mutate(mut input: Value, idx: usize, key: &str, value: Value) -> Value {
        input["layers"][idx][key] = value;
        input
    }

    #[test]
    fn test_valid_download_input() {
        assert!(check_download_input(&download_input()));
        let requests = parse_download_input(&download_input()).unwrap();
        assert_eq!(3, requests.len());
        assert_eq!("bicycle_parking", requests[0].name);
        assert_eq!(None, requests[0].time);
        assert_eq!(Some("2021-01-01".to_string()), requests[1].time);
        assert_eq!(None, requests[2].time);
        assert_eq!("polygons/heidelberg.fgb", requests[2].polygon);
    }

    #[test]
    fn test_single_bad_row_rejects_download_batch() {
        let broken = vec![
            mutate(download_input(), 0, "name", json!(42)),
            mutate(download_input(), 1, "filter", json!("highway")),
            mutate(download_input(), 2, "polygon", json!("area.shp")),
            mutate(download_input(), 2, "name", json!("highways")),
            mutate(download_input(), 1, "time", json!(2021)),
        ];
        for input in broken {
            assert!(!check_download_input(&input), "{} was accepted", input);
            assert!(matches!(
                parse_download_input(&input),
                Err(InputError::Value(_))
            ));
        }
    }

    #[test]
    fn test_layer_names_stay_in_data_dir() {
        for name in ["", "  ", "../outside", "..", "nested/layer", "C:\\layer", "/abs"] {
            let input = mutate(download_input(), 0, "name", json!(name));
            assert!(!check_download_input(&input), "{} was accepted", name);
            assert!(matches!(
                parse_download_input(&input),
                Err(InputError::Value(_))
            ));
        }
        // Dots elsewhere are fine
        let input = mutate(download_input(), 0, "name", json!("bike.parking"));
        assert_eq!("bike.parking", parse_download_input(&input).unwrap()[0].name);

        let plots = mutate(plotting_input(), 1, "name", json!("../highways"));
        assert!(matches!(
            parse_plotting_input(&plots),
            Err(InputError::Value(_))
        ));
    }

    #[test]
    fn test_schema_errors() {
        let mut missing = download_input();
        missing["layers"][1]
            .as_object_mut()
            .unwrap()
            .remove("filter");
        assert!(!check_download_input(&missing));
        assert!(matches!(
            parse_download_input(&missing),
            Err(InputError::Schema(_))
        ));

        for input in [
            json!({}),
            json!({ "layers": [] }),
            json!({ "layers": ["bicycle_parking"] }),
        ] {
            assert!(matches!(
                parse_download_input(&input),
                Err(InputError::Schema(_))
            ));
        }

        // Downloading doesn't need a color, and plotting needs one
        assert!(matches!(
            parse_plotting_input(&download_input()),
            Err(InputError::Schema(_))
        ));
    }

    #[test]
    fn test_missing_time_is_absent() {
        let mut input = download_input();
        input["layers"][1].as_object_mut().unwrap().remove("time");
        let requests = parse_download_input(&input).unwrap();
        assert_eq!(None, requests[1].time);
    }

    #[test]
    fn test_keys_are_capitalized() {
        let input = json!({
            "layers": [{ "NAME": "parks", "Color": "green" }]
        });
        let specs = parse_plotting_input(&input).unwrap();
        assert_eq!("parks", specs[0].name);
        assert_eq!("green", specs[0].color);
    }

    #[test]
    fn test_plotting_input() {
        assert!(check_plotting_input(&plotting_input()));
        for color in ["#xyz", "notacolor", "#abcd", "Red", ""] {
            let input = mutate(plotting_input(), 1, "color", json!(color));
            assert!(!check_plotting_input(&input), "{} was accepted", color);
        }
        let input = mutate(plotting_input(), 0, "name", Value::Null);
        assert!(!check_plotting_input(&input));
    }

    #[test]
    fn test_cross_check() {
        let requests = parse_download_input(&download_input()).unwrap();
        let plots = parse_plotting_input(&plotting_input()).unwrap();
        assert_eq!(Ok(()), cross_check(&plots, &requests));
        // Drawing fewer layers than downloaded is fine
        assert_eq!(Ok(()), cross_check(&plots[..1], &requests));

        let input = mutate(plotting_input(), 2, "name", json!("parks"));
        let plots = parse_plotting_input(&input).unwrap();
        assert!(matches!(
            cross_check(&plots, &requests),
            Err(InputError::Value(_))
        ));
    }

    #[test]
    fn test_delimited_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input_download.txt");
        fs_err::write(
            &path,
            "name, filter, time, polygon\n\
             bicycle_parking, amenity=bicycle_parking, None, input_polygon.geojson\n\
             highways, highway=*, 2021-01-01, input_polygon.geojson\n",
        )
        .unwrap();

        let input = read_input_file(&path).unwrap();
        let requests = parse_download_input(&input).unwrap();
        assert_eq!(
            LayerRequest {
                name: "bicycle_parking".to_string(),
                filter: "amenity=bicycle_parking".to_string(),
                time: None,
                polygon: "input_polygon.geojson".to_string(),
            },
            requests[0]
        );
        assert_eq!(Some("2021-01-01".to_string()), requests[1].time);
    }

    #[test]
    fn test_json_input_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input_static.json");
        fs_err::write(&path, plotting_input().to_string()).unwrap();
        assert!(check_plotting_input(&read_input_file(&path).unwrap()));

        assert!(read_input_file(dir.path().join("missing.json")).is_err());
    }
}
