//! Approximate state/district labels from a coordinate.
//!
//! Classification walks [`STATE_RULES`] in order and stops at the first
//! state rectangle containing the point; inside it, district rectangles are
//! tried in order with a per-state fallback. Rectangles overlap (the
//! Andhra Pradesh/Telangana, Northeast and Jammu & Kashmir/Ladakh rules most
//! visibly), so the table order decides the answer and must not be
//! re-sorted.

use crate::geometry::{outer_centroid, parse_geometry};
use crate::models::RegionLabel;
use geo::Geometry;
use serde_json::Value;
use tracing::debug;

/// Inclusive lat/lon rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl Bounds {
    pub const fn new(lat_min: f64, lat_max: f64, lon_min: f64, lon_max: f64) -> Self {
        Self {
            lat_min,
            lat_max,
            lon_min,
            lon_max,
        }
    }

    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        self.lat_min <= lat && lat <= self.lat_max && self.lon_min <= lon && lon <= self.lon_max
    }
}

#[derive(Debug)]
pub struct DistrictRule {
    pub bounds: Bounds,
    pub districts: &'static [&'static str],
    /// Overrides the enclosing rule's state inside shared rectangles
    pub state: Option<&'static str>,
}

#[derive(Debug)]
pub struct StateRule {
    pub bounds: Bounds,
    pub state: &'static str,
    pub districts: &'static [DistrictRule],
    pub fallback_districts: &'static [&'static str],
}

impl StateRule {
    fn label(&self, lat: f64, lon: f64) -> RegionLabel {
        match self.districts.iter().find(|d| d.bounds.contains(lat, lon)) {
            Some(district) => {
                RegionLabel::new(district.districts, district.state.unwrap_or(self.state))
            }
            None => RegionLabel::new(self.fallback_districts, self.state),
        }
    }
}

const fn district(
    lat_min: f64,
    lat_max: f64,
    lon_min: f64,
    lon_max: f64,
    districts: &'static [&'static str],
) -> DistrictRule {
    DistrictRule {
        bounds: Bounds::new(lat_min, lat_max, lon_min, lon_max),
        districts,
        state: None,
    }
}

const fn district_in(
    state: &'static str,
    lat_min: f64,
    lat_max: f64,
    lon_min: f64,
    lon_max: f64,
    districts: &'static [&'static str],
) -> DistrictRule {
    DistrictRule {
        bounds: Bounds::new(lat_min, lat_max, lon_min, lon_max),
        districts,
        state: Some(state),
    }
}

/// Ordered rule table. First matching state rectangle wins.
pub static STATE_RULES: &[StateRule] = &[
    StateRule {
        bounds: Bounds::new(24.0, 30.2, 69.5, 78.2),
        state: "Rajasthan",
        districts: &[
            district(26.8, 28.4, 75.0, 76.8, &["Jaipur", "Alwar", "Sikar"]),
            district(24.3, 26.0, 70.9, 73.8, &["Jodhpur", "Barmer", "Jaisalmer"]),
            district(27.0, 28.9, 73.0, 75.5, &["Bikaner", "Ganganagar", "Hanumangarh"]),
            district(24.0, 25.8, 73.7, 75.8, &["Udaipur", "Rajsamand", "Dungarpur"]),
        ],
        fallback_districts: &["Central Rajasthan"],
    },
    StateRule {
        bounds: Bounds::new(20.1, 24.7, 68.2, 74.5),
        state: "Gujarat",
        districts: &[
            district(22.2, 23.8, 72.0, 73.2, &["Ahmedabad", "Gandhinagar", "Mehsana"]),
            district(21.1, 22.3, 70.0, 72.1, &["Rajkot", "Jamnagar", "Porbandar"]),
            district(20.9, 21.9, 72.7, 73.2, &["Surat", "Navsari", "Valsad"]),
            district(22.7, 24.2, 68.8, 71.8, &["Kutch", "Banaskantha", "Patan"]),
        ],
        fallback_districts: &["Central Gujarat"],
    },
    StateRule {
        bounds: Bounds::new(15.6, 22.0, 72.6, 80.9),
        state: "Maharashtra",
        districts: &[
            district(18.8, 19.3, 72.7, 73.2, &["Mumbai", "Mumbai Suburban", "Thane"]),
            district(18.4, 18.7, 73.7, 74.0, &["Pune", "Pimpri-Chinchwad"]),
            district(19.7, 21.2, 78.0, 79.3, &["Nagpur", "Wardha", "Chandrapur"]),
            district(19.0, 20.3, 74.7, 76.0, &["Aurangabad", "Jalna", "Beed"]),
        ],
        fallback_districts: &["Central Maharashtra"],
    },
    StateRule {
        bounds: Bounds::new(11.5, 18.5, 74.0, 78.6),
        state: "Karnataka",
        districts: &[
            district(12.8, 13.2, 77.4, 77.8, &["Bangalore Urban", "Bangalore Rural"]),
            district(15.3, 15.9, 75.0, 75.8, &["Belgaum", "Bagalkot", "Bijapur"]),
            district(13.3, 14.5, 74.8, 75.8, &["Mysore", "Mandya", "Hassan"]),
            district(14.4, 15.6, 76.0, 77.6, &["Bellary", "Raichur", "Koppal"]),
        ],
        fallback_districts: &["Central Karnataka"],
    },
    StateRule {
        bounds: Bounds::new(8.1, 13.6, 76.2, 80.3),
        state: "Tamil Nadu",
        districts: &[
            district(12.8, 13.2, 79.8, 80.3, &["Chennai", "Kanchipuram", "Tiruvallur"]),
            district(10.7, 11.1, 76.9, 77.8, &["Coimbatore", "Tirupur", "Erode"]),
            district(9.9, 10.8, 78.0, 78.8, &["Madurai", "Theni", "Dindigul"]),
            district(11.8, 12.5, 79.0, 79.9, &["Vellore", "Tiruvannamalai", "Villupuram"]),
        ],
        fallback_districts: &["Central Tamil Nadu"],
    },
    StateRule {
        bounds: Bounds::new(12.6, 19.9, 76.8, 84.8),
        state: "Andhra Pradesh/Telangana",
        districts: &[
            district_in("Telangana", 17.2, 17.6, 78.2, 78.7, &["Hyderabad", "Rangareddy", "Medchal"]),
            district_in(
                "Andhra Pradesh",
                15.8,
                17.1,
                79.7,
                81.8,
                &["Visakhapatnam", "Vizianagaram", "Srikakulam"],
            ),
            district_in("Andhra Pradesh", 14.4, 15.9, 78.1, 80.0, &["Kurnool", "Anantapur", "Kadapa"]),
            district_in("Telangana", 16.5, 19.0, 77.3, 80.5, &["Warangal", "Karimnagar", "Nizamabad"]),
        ],
        fallback_districts: &["Central Region"],
    },
    StateRule {
        bounds: Bounds::new(8.2, 12.8, 74.9, 77.4),
        state: "Kerala",
        districts: &[
            district(9.9, 10.0, 76.2, 76.4, &["Kochi", "Ernakulam"]),
            district(8.4, 8.9, 76.8, 77.1, &["Thiruvananthapuram", "Kollam"]),
            district(11.2, 11.6, 75.7, 76.1, &["Kozhikode", "Malappuram", "Wayanad"]),
            district(9.5, 10.5, 76.0, 77.0, &["Kottayam", "Idukki", "Alappuzha"]),
        ],
        fallback_districts: &["Central Kerala"],
    },
    StateRule {
        bounds: Bounds::new(21.5, 27.1, 85.8, 89.9),
        state: "West Bengal",
        districts: &[
            district(22.4, 22.7, 88.2, 88.5, &["Kolkata", "North 24 Parganas", "South 24 Parganas"]),
            district(23.2, 25.6, 87.8, 89.3, &["Darjeeling", "Jalpaiguri", "Cooch Behar"]),
            district(23.8, 24.6, 87.0, 88.8, &["Malda", "Murshidabad", "Birbhum"]),
        ],
        fallback_districts: &["Central West Bengal"],
    },
    StateRule {
        bounds: Bounds::new(17.8, 22.6, 81.4, 87.5),
        state: "Odisha",
        districts: &[
            district(20.2, 20.4, 85.7, 86.0, &["Bhubaneswar", "Khordha", "Puri"]),
            district(21.4, 22.0, 84.8, 85.8, &["Rourkela", "Sundargarh", "Jharsuguda"]),
            district(19.2, 20.5, 83.9, 85.2, &["Cuttack", "Jagatsinghpur", "Kendrapara"]),
        ],
        fallback_districts: &["Central Odisha"],
    },
    StateRule {
        bounds: Bounds::new(21.1, 26.9, 74.0, 82.8),
        state: "Madhya Pradesh",
        districts: &[
            district(23.1, 23.4, 77.2, 77.6, &["Bhopal", "Sehore", "Raisen"]),
            district(22.6, 23.0, 75.7, 76.1, &["Indore", "Dewas", "Ujjain"]),
            district(24.5, 25.9, 78.0, 80.4, &["Jabalpur", "Katni", "Narsinghpur"]),
            district(24.0, 25.4, 81.2, 82.8, &["Rewa", "Satna", "Sidhi"]),
        ],
        fallback_districts: &["Central Madhya Pradesh"],
    },
    StateRule {
        bounds: Bounds::new(23.9, 30.4, 77.1, 84.6),
        state: "Uttar Pradesh",
        districts: &[
            district(28.4, 28.8, 77.0, 77.4, &["New Delhi", "Ghaziabad", "Gautam Buddha Nagar"]),
            district(26.8, 27.2, 80.8, 81.0, &["Lucknow", "Unnao", "Rae Bareli"]),
            district(25.3, 25.5, 82.9, 83.1, &["Varanasi", "Chandauli", "Jaunpur"]),
            district(27.1, 27.3, 78.0, 78.2, &["Agra", "Mathura", "Firozabad"]),
        ],
        fallback_districts: &["Central Uttar Pradesh"],
    },
    StateRule {
        bounds: Bounds::new(29.5, 32.5, 73.9, 76.9),
        state: "Punjab",
        districts: &[
            district(31.6, 31.8, 74.8, 75.0, &["Amritsar", "Tarn Taran", "Gurdaspur"]),
            district(30.3, 30.5, 75.8, 76.0, &["Ludhiana", "Jalandhar", "Kapurthala"]),
            district(30.9, 31.1, 75.3, 75.5, &["Patiala", "Fatehgarh Sahib", "Sangrur"]),
        ],
        fallback_districts: &["Central Punjab"],
    },
    StateRule {
        bounds: Bounds::new(27.7, 30.9, 74.5, 77.6),
        state: "Haryana",
        districts: &[
            district(28.4, 28.6, 76.9, 77.1, &["Gurugram", "Faridabad", "Palwal"]),
            district(29.1, 29.3, 76.0, 76.2, &["Hisar", "Fatehabad", "Sirsa"]),
            district(28.8, 29.0, 76.6, 76.8, &["Rohtak", "Jhajjar", "Sonipat"]),
        ],
        fallback_districts: &["Central Haryana"],
    },
    StateRule {
        bounds: Bounds::new(21.9, 25.3, 83.3, 87.6),
        state: "Jharkhand",
        districts: &[
            district(23.3, 23.5, 85.2, 85.4, &["Ranchi", "Khunti", "Lohardaga"]),
            district(22.7, 22.9, 86.1, 86.3, &["Jamshedpur", "East Singhbhum", "West Singhbhum"]),
            district(24.6, 24.8, 85.9, 86.1, &["Dhanbad", "Bokaro", "Giridih"]),
        ],
        fallback_districts: &["Central Jharkhand"],
    },
    StateRule {
        bounds: Bounds::new(17.8, 24.1, 80.2, 84.4),
        state: "Chhattisgarh",
        districts: &[
            district(21.2, 21.4, 81.5, 81.7, &["Raipur", "Durg", "Bilaspur"]),
            district(19.0, 19.2, 81.9, 82.1, &["Jagdalpur", "Bastar", "Kondagaon"]),
        ],
        fallback_districts: &["Central Chhattisgarh"],
    },
    StateRule {
        bounds: Bounds::new(24.3, 27.5, 83.3, 88.1),
        state: "Bihar",
        districts: &[
            district(25.5, 25.7, 85.0, 85.2, &["Patna", "Nalanda", "Jehanabad"]),
            district(26.1, 26.3, 85.1, 85.3, &["Muzaffarpur", "Sitamarhi", "Sheohar"]),
        ],
        fallback_districts: &["Central Bihar"],
    },
    StateRule {
        bounds: Bounds::new(24.1, 28.2, 89.7, 97.1),
        state: "Northeast States",
        districts: &[
            district_in("Assam", 26.1, 26.3, 91.7, 91.9, &["Guwahati", "Kamrup", "Nalbari"]),
            district_in(
                "Meghalaya",
                25.5,
                25.7,
                91.8,
                92.0,
                &["Shillong", "East Khasi Hills", "West Khasi Hills"],
            ),
            district_in("Tripura", 23.7, 24.7, 91.2, 92.7, &["Agartala", "West Tripura", "Sepahijala"]),
            district_in(
                "Arunachal Pradesh",
                25.1,
                27.7,
                93.2,
                97.4,
                &["Itanagar", "Papum Pare", "Lower Subansiri"],
            ),
        ],
        fallback_districts: &["Northeast Region"],
    },
    StateRule {
        bounds: Bounds::new(30.2, 33.2, 75.6, 79.0),
        state: "Himachal Pradesh",
        districts: &[
            district(31.1, 31.3, 77.1, 77.3, &["Shimla", "Solan", "Sirmaur"]),
            district(32.2, 32.4, 76.3, 76.5, &["Dharamshala", "Kangra", "Hamirpur"]),
        ],
        fallback_districts: &["Central Himachal Pradesh"],
    },
    StateRule {
        bounds: Bounds::new(28.4, 31.5, 77.6, 81.0),
        state: "Uttarakhand",
        districts: &[
            district(30.3, 30.5, 78.0, 78.2, &["Dehradun", "Tehri Garhwal", "Pauri Garhwal"]),
            district(29.2, 29.4, 79.5, 79.7, &["Nainital", "Almora", "Pithoragarh"]),
        ],
        fallback_districts: &["Central Uttarakhand"],
    },
    StateRule {
        bounds: Bounds::new(32.3, 37.1, 73.3, 80.3),
        state: "Jammu & Kashmir/Ladakh",
        districts: &[
            district_in("Jammu & Kashmir", 34.0, 34.2, 74.7, 74.9, &["Srinagar", "Budgam", "Ganderbal"]),
            district_in("Jammu & Kashmir", 32.7, 32.9, 74.8, 75.0, &["Jammu", "Samba", "Kathua"]),
            district_in("Ladakh", 34.1, 34.3, 77.5, 77.7, &["Leh", "Kargil"]),
        ],
        fallback_districts: &["Northern Region"],
    },
    StateRule {
        bounds: Bounds::new(15.0, 15.8, 73.7, 74.3),
        state: "Goa",
        districts: &[],
        fallback_districts: &["North Goa", "South Goa"],
    },
];

/// Classifies a point against [`STATE_RULES`]. Points outside every
/// rectangle, and non-finite input, give the unknown label.
pub fn classify(lat: f64, lon: f64) -> RegionLabel {
    if !lat.is_finite() || !lon.is_finite() {
        return RegionLabel::unknown();
    }
    STATE_RULES
        .iter()
        .find(|rule| rule.bounds.contains(lat, lon))
        .map_or_else(RegionLabel::unknown, |rule| rule.label(lat, lon))
}

/// Classifies a geometry by its centroid: the point itself, or the
/// area-weighted centroid of a (multi)polygon's outer rings. Degenerate
/// geometry gives the unknown label.
pub fn classify_geometry(geometry: &Geometry<f64>) -> RegionLabel {
    match outer_centroid(geometry) {
        Some(point) => classify(point.y(), point.x()),
        None => {
            debug!("No usable centroid, falling back to unknown region");
            RegionLabel::unknown()
        }
    }
}

fn classify_value(geometry: &Value) -> RegionLabel {
    match parse_geometry(geometry) {
        Ok(geometry) => classify_geometry(&geometry),
        Err(e) => {
            debug!(error = %e, "Unreadable geometry, falling back to unknown region");
            RegionLabel::unknown()
        }
    }
}

/// Writes `districts`/`states` properties onto every feature that lacks
/// both, classifying its centroid. Features that already carry a label are
/// left untouched.
pub fn enrich_collection(collection: &Value) -> Value {
    let mut enriched = collection.clone();
    let Some(features) = enriched.get_mut("features").and_then(Value::as_array_mut) else {
        return enriched;
    };

    for feature in features.iter_mut() {
        let Some(object) = feature.as_object_mut() else {
            continue;
        };
        let labelled = object
            .get("properties")
            .and_then(Value::as_object)
            .is_some_and(|p| p.contains_key("districts") || p.contains_key("states"));
        if labelled {
            continue;
        }

        let label = object
            .get("geometry")
            .map_or_else(RegionLabel::unknown, classify_value);

        let properties = object
            .entry("properties")
            .or_insert_with(|| Value::Object(Default::default()));
        if !properties.is_object() {
            *properties = Value::Object(Default::default());
        }
        if let Some(props) = properties.as_object_mut() {
            props.insert("districts".to_string(), Value::from(label.districts));
            props.insert("states".to_string(), Value::from(label.states));
        }
    }
    enriched
}
