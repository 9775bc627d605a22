//! Translate an element's raw tags into typed features: type codes, localized
//! names and structured address/metadata fields.

pub mod cached;
pub mod filter;
pub mod matcher;
pub mod metadata;
pub mod names;
pub mod params;
pub mod rules;

use crate::classificator::draw::DrawRules;
use crate::classificator::{ClassifError, ClassifTree};
use crate::element::Element;
use cached::CachedTypes;
use metadata::MetadataCollector;
use params::{FeatureParams, MAX_LAYER};
use rules::{Pattern, Rule};

/// The full per-element classification pipeline.
///
/// Holds only shared read-only state, so one instance may classify elements
/// from many threads at once.
pub struct Classifier<'t, D> {
    tree: &'t ClassifTree,
    cached: CachedTypes,
    draw: D,
}

impl<'t, D: DrawRules> Classifier<'t, D> {
    pub fn new(tree: &'t ClassifTree, draw: D) -> Result<Self, ClassifError> {
        Ok(Classifier {
            cached: CachedTypes::new(tree)?,
            tree,
            draw,
        })
    }

    pub fn tree(&self) -> &'t ClassifTree {
        self.tree
    }

    /// Classify one element.
    ///
    /// Consumes tags as it goes: name and address tags are cleared in place,
    /// matched tags are skipped internally. The element keeps its remaining
    /// tags for `meta` and any later inspection.
    pub fn process(&self, element: &mut Element, meta: &impl MetadataCollector) -> FeatureParams {
        let mut params = FeatureParams::default();

        self.derive_layer(element);
        names::extract_names(element, &mut params);
        self.base_rules(element, &mut params);
        matcher::match_types(element, &mut params, self.tree, &self.draw);
        self.refine(element, &mut params);

        params.finish();

        meta.collect(element, &mut params);
        params
    }

    /// Bridges and tunnels imply a layer when the mapper didn't set one.
    fn derive_layer(&self, element: &mut Element) {
        #[derive(Default)]
        struct Derived {
            has_layer: bool,
            layer: Option<&'static str>,
        }

        let mut derived = Derived::default();
        let table: &[Rule<Derived>] = &[
            Rule {
                key: "bridge",
                pattern: Pattern::Exact("yes"),
                action: |d, _, _| d.layer = Some("1"),
            },
            Rule {
                key: "tunnel",
                pattern: Pattern::Exact("yes"),
                action: |d, _, _| d.layer = Some("-1"),
            },
            Rule {
                key: "layer",
                pattern: Pattern::Any,
                action: |d, _, _| d.has_layer = true,
            },
        ];
        rules::apply(element, &mut derived, table);

        if !derived.has_layer {
            if let Some(layer) = derived.layer {
                element.add_tag("layer", layer);
            }
        }
    }

    /// Base rules for tag processing: canonicalize a few key/value spellings
    /// and pull the address and numeric fields out of the tag soup.
    fn base_rules(&self, element: &mut Element, params: &mut FeatureParams) {
        let table: &[Rule<FeatureParams>] = &[
            Rule {
                key: "atm",
                pattern: Pattern::Exact("yes"),
                action: |_, k, v| {
                    std::mem::swap(k, v);
                    *k = "amenity".to_string();
                },
            },
            Rule {
                key: "restaurant",
                pattern: Pattern::Exact("yes"),
                action: |_, k, v| {
                    std::mem::swap(k, v);
                    *k = "amenity".to_string();
                },
            },
            Rule {
                key: "hotel",
                pattern: Pattern::Exact("yes"),
                action: |_, k, v| {
                    std::mem::swap(k, v);
                    *k = "tourism".to_string();
                },
            },
            Rule {
                key: "addr:housename",
                pattern: Pattern::Any,
                action: |params, k, v| {
                    params.add_house_name(std::mem::take(v));
                    k.clear();
                },
            },
            Rule {
                key: "addr:street",
                pattern: Pattern::Any,
                action: |params, k, v| {
                    params.street = std::mem::take(v);
                    k.clear();
                },
            },
            Rule {
                key: "addr:flats",
                pattern: Pattern::Any,
                action: |params, k, v| {
                    params.flats = std::mem::take(v);
                    k.clear();
                },
            },
            Rule {
                key: "addr:housenumber",
                pattern: Pattern::Any,
                action: |params, k, v| {
                    // treat "numbers" like names if they aren't actual numbers
                    let value = std::mem::take(v);
                    if !params.add_house_number(value.clone()) {
                        params.add_house_name(value);
                    }
                    k.clear();
                },
            },
            Rule {
                key: "population",
                pattern: Pattern::Any,
                action: |params, k, v| {
                    if let Ok(population) = v.parse::<u64>() {
                        params.rank = ((population as f64).ln() / 1.1f64.ln()) as u8;
                    }
                    k.clear();
                    v.clear();
                },
            },
            Rule {
                key: "ref",
                pattern: Pattern::Any,
                action: |params, k, v| {
                    // we only process road numbers
                    params.reference = std::mem::take(v);
                    k.clear();
                },
            },
            Rule {
                key: "layer",
                pattern: Pattern::Any,
                action: |params, _, v| {
                    // the first layer tag wins
                    if params.layer == 0 {
                        let layer = v.parse::<i32>().unwrap_or(0);
                        params.layer = layer.clamp(-(MAX_LAYER as i32), MAX_LAYER as i32) as i8;
                    }
                },
            },
        ];
        rules::apply(element, params, table);
    }

    fn refine(&self, element: &mut Element, params: &mut FeatureParams) {
        // An entrance designation is meaningless without a reference: for an
        // addressed building it must not mask the address itself.
        if params.has_house() && params.pop_exact_type(self.cached.entrance) {
            params.names.clear();
            params.add_type(self.cached.address);
        }

        let mut highway_done = false;
        let mut subway_done = false;
        let mut railway_done = false;

        // work on a copy of the types, the rules below modify params
        let produced: Vec<u32> = params.types().to_vec();
        for packed in produced {
            if !highway_done && self.cached.is_highway(packed) {
                self.refine_highway(element, params);
                highway_done = true;
            }

            if !subway_done && self.cached.is_rw_subway(packed) {
                self.refine_subway(element, params);
                subway_done = true;
            }

            if !subway_done && !railway_done && self.cached.is_rw_station(packed) {
                self.refine_railway(element, params);
                railway_done = true;
            }
        }
    }

    fn refine_highway(&self, element: &mut Element, params: &mut FeatureParams) {
        struct Ctx<'a> {
            params: &'a mut FeatureParams,
            cached: &'a CachedTypes,
        }

        let table: &[Rule<Ctx>] = &[
            Rule {
                key: "oneway",
                pattern: Pattern::Exact("yes"),
                action: |ctx, _, _| ctx.params.add_type(ctx.cached.oneway),
            },
            Rule {
                key: "oneway",
                pattern: Pattern::Exact("1"),
                action: |ctx, _, _| ctx.params.add_type(ctx.cached.oneway),
            },
            Rule {
                key: "oneway",
                pattern: Pattern::Exact("-1"),
                action: |ctx, _, _| {
                    ctx.params.add_type(ctx.cached.oneway);
                    ctx.params.reverse_geometry = true;
                },
            },
            Rule {
                key: "access",
                pattern: Pattern::Exact("private"),
                action: |ctx, _, _| ctx.params.add_type(ctx.cached.private),
            },
            Rule {
                key: "lit",
                pattern: Pattern::Affirmative,
                action: |ctx, _, _| ctx.params.add_type(ctx.cached.lit),
            },
            Rule {
                key: "foot",
                pattern: Pattern::Negative,
                action: |ctx, _, _| ctx.params.add_type(ctx.cached.nofoot),
            },
            Rule {
                key: "foot",
                pattern: Pattern::Affirmative,
                action: |ctx, _, _| ctx.params.add_type(ctx.cached.yesfoot),
            },
            Rule {
                key: "sidewalk",
                pattern: Pattern::Affirmative,
                action: |ctx, _, _| ctx.params.add_type(ctx.cached.yesfoot),
            },
        ];

        let mut ctx = Ctx {
            params,
            cached: &self.cached,
        };
        rules::apply(element, &mut ctx, table);
    }

    fn refine_subway(&self, element: &mut Element, params: &mut FeatureParams) {
        let table: &[Rule<SubwayCtx>] = &[
            Rule {
                key: "network",
                pattern: Pattern::Exact("London Underground"),
                action: |ctx, _, _| ctx.set_city("london"),
            },
            Rule {
                key: "network",
                pattern: Pattern::Exact("New York City Subway"),
                action: |ctx, _, _| ctx.set_city("newyork"),
            },
            Rule {
                key: "network",
                pattern: Pattern::Exact("Московский метрополитен"),
                action: |ctx, _, _| ctx.set_city("moscow"),
            },
            Rule {
                key: "network",
                pattern: Pattern::Exact("Петербургский метрополитен"),
                action: |ctx, _, _| ctx.set_city("spb"),
            },
            Rule {
                key: "network",
                pattern: Pattern::Exact("Verkehrsverbund Berlin-Brandenburg"),
                action: |ctx, _, _| ctx.set_city("berlin"),
            },
            Rule {
                key: "network",
                pattern: Pattern::Exact("Минский метрополитен"),
                action: |ctx, _, _| ctx.set_city("minsk"),
            },
            Rule {
                key: "network",
                pattern: Pattern::Exact("Київський метрополітен"),
                action: |ctx, _, _| ctx.set_city("kiev"),
            },
            Rule {
                key: "operator",
                pattern: Pattern::Exact("КП «Київський метрополітен»"),
                action: |ctx, _, _| ctx.set_city("kiev"),
            },
            Rule {
                key: "network",
                pattern: Pattern::Exact("RATP"),
                action: |ctx, _, _| ctx.set_city("paris"),
            },
            Rule {
                key: "network",
                pattern: Pattern::Exact("Metro de Barcelona"),
                action: |ctx, _, _| ctx.set_city("barcelona"),
            },
            Rule {
                key: "network",
                pattern: Pattern::Exact("Metro de Madrid"),
                action: |ctx, _, _| ctx.set_city("madrid"),
            },
            Rule {
                key: "operator",
                pattern: Pattern::Exact("Metro de Madrid"),
                action: |ctx, _, _| ctx.set_city("madrid"),
            },
            Rule {
                key: "network",
                pattern: Pattern::Exact("Metropolitana di Roma"),
                action: |ctx, _, _| ctx.set_city("roma"),
            },
            Rule {
                key: "network",
                pattern: Pattern::Exact("ATAC"),
                action: |ctx, _, _| ctx.set_city("roma"),
            },
        ];

        let mut ctx = SubwayCtx {
            params,
            tree: self.tree,
            cached: &self.cached,
            applied: false,
        };
        rules::apply(element, &mut ctx, table);
    }

    /// A station tagged with a known subway network is a subway station after
    /// all, even when the subway subtype itself wasn't matched.
    fn refine_railway(&self, element: &mut Element, params: &mut FeatureParams) {
        let table: &[Rule<SubwayCtx>] = &[Rule {
            key: "network",
            pattern: Pattern::Exact("London Underground"),
            action: |ctx, _, _| ctx.set_city("london"),
        }];

        let mut ctx = SubwayCtx {
            params,
            tree: self.tree,
            cached: &self.cached,
            applied: false,
        };
        rules::apply(element, &mut ctx, table);
    }
}

struct SubwayCtx<'a> {
    params: &'a mut FeatureParams,
    tree: &'a ClassifTree,
    cached: &'a CachedTypes,
    applied: bool,
}

impl SubwayCtx<'_> {
    /// Replace the first station type with the city-specific subway subtype.
    /// The first matching rule wins.
    fn set_city(&mut self, city: &str) {
        use crate::classificator::code;

        if self.applied {
            return;
        }
        let Some(target) = self
            .tree
            .type_by_path(&["railway", "station", "subway", city])
        else {
            return;
        };

        for packed in self.params.types_mut() {
            let mut station = *packed;
            code::trunc(&mut station, 2);
            if station == self.cached.rw_station {
                *packed = target;
                self.applied = true;
                return;
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::classificator::draw::DrawingRules;
    use crate::element::ElementKind;
    use crate::features::metadata::NoMetadata;

    const TREE: &str = "
        entrance *
        highway * { primary * { bridge * tunnel * } residential * footway * { area * } }
        hwtag { oneway * private * lit * nofoot * yesfoot * }
        building * { address * }
        railway * { station * { subway * { london * moscow * paris * } } rail * }
        amenity { atm * cafe * }
        tourism { hotel * }
        place { city * { capital * { 2 * } } town * }
        boundary { administrative * { 2 * 4 * } }
    ";

    fn classifier(tree: &ClassifTree) -> Classifier<DrawingRules> {
        let draw = DrawingRules::from_tree(tree);
        Classifier::new(tree, draw).unwrap()
    }

    fn process(tree: &ClassifTree, tags: &[(&str, &str)]) -> (Element, FeatureParams) {
        let mut element = Element::new(ElementKind::Line);
        for (key, value) in tags {
            element.add_tag(*key, *value);
        }
        let params = classifier(tree).process(&mut element, &NoMetadata);
        (element, params)
    }

    fn types(tree: &ClassifTree, params: &FeatureParams) -> Vec<String> {
        params
            .types()
            .iter()
            .map(|&t| tree.readable_name(t).unwrap())
            .collect()
    }

    #[test]
    fn oneway_primary_with_name() {
        let tree: ClassifTree = TREE.parse().unwrap();
        let (_, params) = process(
            &tree,
            &[("highway", "primary"), ("oneway", "yes"), ("name", "Main St")],
        );

        let mut produced = types(&tree, &params);
        produced.sort();
        assert_eq!(produced, ["highway|primary", "hwtag|oneway"]);
        assert_eq!(params.names.get("default").unwrap(), "Main St");
        assert!(!params.has_house());
        assert!(!params.reverse_geometry);
    }

    #[test]
    fn reversed_oneway_sets_the_geometry_flag() {
        let tree: ClassifTree = TREE.parse().unwrap();
        let (_, params) = process(&tree, &[("highway", "residential"), ("oneway", "-1")]);
        assert!(params.reverse_geometry);
        assert!(types(&tree, &params).contains(&"hwtag|oneway".to_string()));
    }

    #[test]
    fn highway_rules_only_fire_for_highways() {
        let tree: ClassifTree = TREE.parse().unwrap();
        let (_, params) = process(&tree, &[("amenity", "cafe"), ("oneway", "yes")]);
        assert_eq!(types(&tree, &params), ["amenity|cafe"]);
    }

    #[test]
    fn addressed_building() {
        let tree: ClassifTree = TREE.parse().unwrap();
        let (_, params) = process(
            &tree,
            &[
                ("building", "yes"),
                ("addr:housenumber", "12"),
                ("addr:street", "Elm"),
            ],
        );
        assert_eq!(params.house_number, "12");
        assert_eq!(params.street, "Elm");
        assert_eq!(types(&tree, &params), ["building"]);
    }

    #[test]
    fn non_numeric_house_numbers_become_house_names() {
        let tree: ClassifTree = TREE.parse().unwrap();
        let (_, params) = process(&tree, &[("addr:housenumber", "Villa Rosa")]);
        assert_eq!(params.house_number, "");
        assert_eq!(params.house_name, "Villa Rosa");
    }

    #[test]
    fn entrances_with_addresses_become_addresses() {
        let tree: ClassifTree = TREE.parse().unwrap();
        let (_, params) = process(
            &tree,
            &[
                ("entrance", "main"),
                ("addr:housenumber", "12"),
                ("name", "Door A"),
            ],
        );
        assert_eq!(types(&tree, &params), ["building|address"]);
        assert!(params.names.is_empty());
    }

    #[test]
    fn entrances_without_addresses_stay_entrances() {
        let tree: ClassifTree = TREE.parse().unwrap();
        let (_, params) = process(&tree, &[("entrance", "main")]);
        assert_eq!(types(&tree, &params), ["entrance"]);
    }

    #[test]
    fn subway_network_assigns_the_city_subtype() {
        let tree: ClassifTree = TREE.parse().unwrap();
        let (_, params) = process(
            &tree,
            &[
                ("railway", "station"),
                ("station", "subway"),
                ("network", "London Underground"),
            ],
        );
        assert_eq!(types(&tree, &params), ["railway|station|subway|london"]);
    }

    #[test]
    fn railway_station_falls_back_to_the_london_table() {
        let tree: ClassifTree = TREE.parse().unwrap();
        let (_, params) = process(
            &tree,
            &[("railway", "station"), ("network", "London Underground")],
        );
        assert_eq!(types(&tree, &params), ["railway|station|subway|london"]);
    }

    #[test]
    fn other_networks_do_not_promote_plain_stations() {
        let tree: ClassifTree = TREE.parse().unwrap();
        let (_, params) = process(&tree, &[("railway", "station"), ("network", "RATP")]);
        assert_eq!(types(&tree, &params), ["railway|station"]);
    }

    #[test]
    fn bridges_derive_a_layer() {
        let tree: ClassifTree = TREE.parse().unwrap();
        let (_, params) = process(&tree, &[("highway", "primary"), ("bridge", "yes")]);
        assert_eq!(params.layer, 1);

        let (_, params) = process(&tree, &[("highway", "primary"), ("tunnel", "yes")]);
        assert_eq!(params.layer, -1);
    }

    #[test]
    fn explicit_layers_win_over_derived_ones() {
        let tree: ClassifTree = TREE.parse().unwrap();
        let (_, params) = process(
            &tree,
            &[("highway", "primary"), ("bridge", "yes"), ("layer", "3")],
        );
        assert_eq!(params.layer, 3);
    }

    #[test]
    fn layers_are_clamped() {
        let tree: ClassifTree = TREE.parse().unwrap();
        let (_, params) = process(&tree, &[("highway", "primary"), ("layer", "250")]);
        assert_eq!(params.layer, 10);
    }

    #[test]
    fn population_becomes_a_rank() {
        let tree: ClassifTree = TREE.parse().unwrap();
        let (_, params) = process(&tree, &[("place", "town"), ("population", "10000")]);
        // ln(10000) / ln(1.1)
        assert_eq!(params.rank, 96);

        let (_, params) = process(&tree, &[("place", "town"), ("population", "many")]);
        assert_eq!(params.rank, 0);
    }

    #[test]
    fn atm_spelling_is_canonicalized() {
        let tree: ClassifTree = TREE.parse().unwrap();
        let (_, params) = process(&tree, &[("atm", "yes")]);
        assert_eq!(types(&tree, &params), ["amenity|atm"]);

        let (_, params) = process(&tree, &[("hotel", "yes")]);
        assert_eq!(types(&tree, &params), ["tourism|hotel"]);
    }

    #[test]
    fn references_are_extracted() {
        let tree: ClassifTree = TREE.parse().unwrap();
        let (element, params) = process(&tree, &[("highway", "primary"), ("ref", "A1")]);
        assert_eq!(params.reference, "A1");
        // consumed, so the matcher never saw it
        assert_eq!(element.tags()[1].key, "");
    }

    #[test]
    fn processing_is_deterministic() {
        let tree: ClassifTree = TREE.parse().unwrap();
        let tags = [
            ("highway", "primary"),
            ("oneway", "yes"),
            ("name", "Main St"),
            ("name:en", "Main Street"),
            ("ref", "B7"),
            ("layer", "2"),
        ];
        let (_, first) = process(&tree, &tags);
        let (_, second) = process(&tree, &tags);
        assert_eq!(first, second);
    }

    #[test]
    fn metadata_runs_after_finalization() {
        let tree: ClassifTree = TREE.parse().unwrap();
        let mut element = Element::new(ElementKind::Point);
        element.add_tag("amenity", "cafe");
        element.add_tag("cuisine", "coffee_shop");

        let collector = |element: &mut Element, params: &mut FeatureParams| {
            filter::for_each_tag::<()>(element, |k, v| {
                if k == "cuisine" {
                    params.add_name("cuisine".to_string(), std::mem::take(v));
                    k.clear();
                }
                None
            });
        };

        let params = classifier(&tree).process(&mut element, &collector);
        assert_eq!(params.names.get("cuisine").unwrap(), "coffee_shop");
        assert_eq!(element.tags()[1].key, "");
    }
}
