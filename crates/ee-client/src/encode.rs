//! Encoding of typed expressions into the Earth Engine value-node graph.
//!
//! The graph is flat: every function invocation is stored once in `values`
//! under a numeric key and referenced by `valueReference`. Identical nodes
//! (the region geometry repeated on every table row, for example) share a key.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use cmip5_common::Region;

use crate::expr::{CollectionExpr, Filter, ImageExpr, RegionReduction, TableExpr};

const MAPPING_VAR: &str = "_MAPPING_VAR_0_0";

/// A serialized computation, as accepted in the `expression` field of REST requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expression {
    pub result: String,
    pub values: BTreeMap<String, Value>,
}

impl Expression {
    /// The node the expression evaluates to.
    pub fn root(&self) -> Option<&Value> {
        self.values.get(&self.result)
    }

    /// Name of the function invoked by the node stored under `key`.
    pub fn function_name(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)?
            .get("functionInvocationValue")?
            .get("functionName")?
            .as_str()
    }

    /// Number of invocations of `function` anywhere in the graph.
    pub fn count_invocations(&self, function: &str) -> usize {
        self.values
            .keys()
            .filter(|key| self.function_name(key) == Some(function))
            .count()
    }
}

pub fn encode_collection(collection: &CollectionExpr) -> Expression {
    let mut graph = GraphBuilder::default();
    let root = graph.collection(collection);
    graph.finish(root)
}

pub fn encode_image(image: &ImageExpr) -> Expression {
    let mut graph = GraphBuilder::default();
    let root = graph.image(image);
    graph.finish(root)
}

pub fn encode_table(table: &TableExpr) -> Expression {
    let mut graph = GraphBuilder::default();
    let features = table.rows.iter().map(|row| graph.row(row)).collect();
    let root = graph.invoke("Collection", vec![("features", array(features))]);
    graph.finish(root)
}

fn constant(value: impl Serialize) -> Value {
    json!({ "constantValue": value })
}

fn array(values: Vec<Value>) -> Value {
    json!({ "arrayValue": { "values": values } })
}

fn reference_key(node: &Value) -> Option<&str> {
    node.get("valueReference").and_then(Value::as_str)
}

#[derive(Default)]
struct GraphBuilder {
    values: BTreeMap<String, Value>,
    interned: HashMap<String, String>,
}

impl GraphBuilder {
    /// Store a node and return a reference to it.
    fn push(&mut self, node: Value) -> Value {
        let fingerprint = node.to_string();
        if let Some(key) = self.interned.get(&fingerprint) {
            return json!({ "valueReference": key });
        }
        let key = self.values.len().to_string();
        self.values.insert(key.clone(), node);
        self.interned.insert(fingerprint, key.clone());
        json!({ "valueReference": key })
    }

    fn invoke(&mut self, function: &str, arguments: Vec<(&str, Value)>) -> Value {
        let arguments: Map<String, Value> = arguments
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect();
        self.push(json!({
            "functionInvocationValue": {
                "functionName": function,
                "arguments": arguments,
            }
        }))
    }

    fn finish(mut self, root: Value) -> Expression {
        let root = if reference_key(&root).is_some() {
            root
        } else {
            self.push(root)
        };
        let result = reference_key(&root).unwrap_or_default().to_string();
        Expression {
            result,
            values: self.values,
        }
    }

    fn filter(&mut self, filter: &Filter) -> Value {
        match filter {
            Filter::Date { start, end } => {
                let range = self.invoke(
                    "DateRange",
                    vec![
                        ("start", constant(start.format("%Y-%m-%d").to_string())),
                        ("end", constant(end.format("%Y-%m-%d").to_string())),
                    ],
                );
                self.invoke(
                    "Filter.dateRangeContains",
                    vec![
                        ("leftValue", range),
                        ("rightField", constant("system:time_start")),
                    ],
                )
            }
            Filter::Equals { property, value } => self.invoke(
                "Filter.equals",
                vec![
                    ("leftField", constant(property)),
                    ("rightValue", constant(value)),
                ],
            ),
            Filter::CalendarYear(year) => self.invoke(
                "Filter.calendarRange",
                vec![
                    ("start", constant(year)),
                    ("end", constant(year)),
                    ("field", constant("year")),
                ],
            ),
        }
    }

    fn collection(&mut self, collection: &CollectionExpr) -> Value {
        let mut node = self.invoke(
            "ImageCollection.load",
            vec![("id", constant(&collection.dataset))],
        );
        for filter in &collection.filters {
            let filter = self.filter(filter);
            node = self.invoke(
                "Collection.filter",
                vec![("collection", node), ("filter", filter)],
            );
        }
        if let Some(band) = &collection.band {
            let body = self.invoke(
                "Image.select",
                vec![
                    ("input", json!({ "argumentReference": MAPPING_VAR })),
                    ("bandSelectors", constant([band])),
                ],
            );
            let body_key = reference_key(&body).unwrap_or_default().to_string();
            let function = json!({
                "functionDefinitionValue": {
                    "argumentNames": [MAPPING_VAR],
                    "body": body_key,
                }
            });
            node = self.invoke(
                "Collection.map",
                vec![("collection", node), ("baseAlgorithm", function)],
            );
        }
        node
    }

    fn geometry(&mut self, region: &Region) -> Value {
        self.invoke(
            "GeometryConstructors.Polygon",
            vec![
                ("coordinates", constant([region.ring()])),
                ("geodesic", constant(false)),
            ],
        )
    }

    // Band stacks are walked iteratively along their `base` spine.
    fn band_stack(&mut self, image: &ImageExpr) -> Value {
        let mut appended = Vec::new();
        let mut current = image;
        while let ImageExpr::AddBands { base, band } = current {
            appended.push(band.as_ref());
            current = base;
        }
        let mut node = self.image(current);
        for band in appended.into_iter().rev() {
            let src = self.image(band);
            node = self.invoke("Image.addBands", vec![("dstImg", node), ("srcImg", src)]);
        }
        node
    }

    fn image(&mut self, image: &ImageExpr) -> Value {
        match image {
            ImageExpr::Load { asset_id, band } => {
                let loaded = self.invoke("Image.load", vec![("id", constant(asset_id))]);
                match band {
                    Some(band) => self.invoke(
                        "Image.select",
                        vec![("input", loaded), ("bandSelectors", constant([band]))],
                    ),
                    None => loaded,
                }
            }
            ImageExpr::Reduce {
                collection,
                reducer,
            } => {
                let collection = self.collection(collection);
                self.invoke(
                    &format!("reduce.{}", reducer.name()),
                    vec![("collection", collection)],
                )
            }
            ImageExpr::Multiply { image, factor } => {
                let input = self.image(image);
                let factor = self.invoke("Image.constant", vec![("value", constant(factor))]);
                self.invoke("Image.multiply", vec![("image1", input), ("image2", factor)])
            }
            ImageExpr::AddScalar { image, value } => {
                let input = self.image(image);
                let value = self.invoke("Image.constant", vec![("value", constant(value))]);
                self.invoke("Image.add", vec![("image1", input), ("image2", value)])
            }
            ImageExpr::Rename { image, name } => {
                let input = self.image(image);
                self.invoke(
                    "Image.select",
                    vec![
                        ("input", input),
                        ("bandSelectors", constant([0])),
                        ("newNames", constant([name])),
                    ],
                )
            }
            ImageExpr::Clip { image, region } => {
                let input = self.image(image);
                let geometry = self.geometry(region);
                self.invoke("Image.clip", vec![("input", input), ("geometry", geometry)])
            }
            ImageExpr::Reproject { image, crs, scale } => {
                let input = self.image(image);
                let projection = match crs {
                    Some(crs) => self.invoke("Projection", vec![("crs", constant(crs))]),
                    None => self.invoke("Image.projection", vec![("image", input.clone())]),
                };
                let scaled = self.invoke(
                    "Projection.atScale",
                    vec![("projection", projection), ("meters", constant(scale))],
                );
                self.invoke("Image.reproject", vec![("image", input), ("crs", scaled)])
            }
            ImageExpr::AddBands { .. } => self.band_stack(image),
        }
    }

    fn row(&mut self, row: &RegionReduction) -> Value {
        let image = self.image(&row.image);
        let geometry = self.geometry(&row.region);
        let feature = self.invoke("Feature", vec![("geometry", geometry)]);
        let regions = self.invoke("Collection", vec![("features", array(vec![feature]))]);
        let reducer = self.invoke(&format!("Reducer.{}", row.reducer.name()), vec![]);
        let reduced = self.invoke(
            "Image.reduceRegions",
            vec![
                ("image", image),
                ("collection", regions),
                ("reducer", reducer),
                ("scale", constant(row.scale)),
            ],
        );
        let first = self.invoke("Collection.first", vec![("collection", reduced)]);
        self.invoke(
            "Element.set",
            vec![
                ("object", first),
                ("key", constant("year")),
                ("value", constant(row.year)),
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Reducer;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn daily() -> CollectionExpr {
        CollectionExpr::load("NASA/NEX-GDDP")
            .filter_date(d(2000, 1, 1), d(2003, 1, 1))
            .select("tasmax")
            .filter_eq("scenario", "historical")
            .filter_eq("model", "ACCESS1-0")
    }

    #[test]
    fn test_result_points_at_root_invocation() {
        let expr = encode_collection(&daily());
        assert_eq!(expr.function_name(&expr.result), Some("Collection.map"));
        assert_eq!(expr.count_invocations("Collection.filter"), 3);
        assert_eq!(expr.count_invocations("ImageCollection.load"), 1);
    }

    #[test]
    fn test_mapping_function_body_is_a_stored_select() {
        let expr = encode_collection(&daily());
        let root = expr.root().unwrap();
        let body = root["functionInvocationValue"]["arguments"]["baseAlgorithm"]
            ["functionDefinitionValue"]["body"]
            .as_str()
            .unwrap();
        assert_eq!(expr.function_name(body), Some("Image.select"));
    }

    #[test]
    fn test_multiply_then_add() {
        let image = daily()
            .reduce(Reducer::Mean)
            .multiply(1.0)
            .add_scalar(-273.15);
        let expr = encode_image(&image);
        assert_eq!(expr.function_name(&expr.result), Some("Image.add"));

        let root = expr.root().unwrap();
        let inner = root["functionInvocationValue"]["arguments"]["image1"]["valueReference"]
            .as_str()
            .unwrap();
        assert_eq!(expr.function_name(inner), Some("Image.multiply"));
        assert_eq!(expr.count_invocations("reduce.mean"), 1);
    }

    #[test]
    fn test_shared_geometry_is_interned() {
        let region = Region::new(-70.0, -35.0, -60.0, -25.0);
        let rows = (2000..2003)
            .map(|year| RegionReduction {
                image: daily().filter_year(year).reduce(Reducer::Mean),
                region,
                reducer: Reducer::Mean,
                scale: 500.0,
                year,
            })
            .collect();
        let expr = encode_table(&TableExpr::new(rows));

        assert_eq!(expr.function_name(&expr.result), Some("Collection"));
        assert_eq!(expr.count_invocations("GeometryConstructors.Polygon"), 1);
        assert_eq!(expr.count_invocations("Image.reduceRegions"), 3);
        assert_eq!(expr.count_invocations("Element.set"), 3);
        assert_eq!(expr.count_invocations("Reducer.mean"), 1);
    }

    #[test]
    fn test_band_stack_encodes_one_add_bands_per_extra_band() {
        let mut image = ImageExpr::load("NASA/NEX-GDDP/d0", Some("pr")).rename("d0");
        for i in 1..366 {
            image = image.add_bands(
                ImageExpr::load(format!("NASA/NEX-GDDP/d{i}"), Some("pr")).rename(format!("d{i}")),
            );
        }
        let expr = encode_image(&image);
        assert_eq!(expr.count_invocations("Image.addBands"), 365);
        assert_eq!(expr.count_invocations("Image.load"), 366);
        assert_eq!(expr.function_name(&expr.result), Some("Image.addBands"));
    }

    #[test]
    fn test_constant_root_is_stored() {
        let graph = GraphBuilder::default();
        let expr = graph.finish(constant(1));
        assert_eq!(expr.values.len(), 1);
        assert_eq!(expr.root(), Some(&json!({ "constantValue": 1 })));
    }
}
