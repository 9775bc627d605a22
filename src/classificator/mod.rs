//! The classification tree: a static hierarchy of recognized type names.
//!
//! The tree is loaded once at startup from a text definition (see
//! `classificator.pest` for the format), is immutable afterwards and is passed
//! around by shared reference. Each node owns an ordered list of uniquely
//! named children; the order of declaration defines the sibling indices used
//! by the type code packing in [`code`].

use std::collections::HashSet;
use std::str::FromStr;

use pest::iterators::Pair;
use pest::Parser;
use yada::builder::DoubleArrayBuilder;
use yada::DoubleArray;

pub mod code;
pub mod draw;

/// The tree definition grammar defined using [pest](https://pest.rs/)
#[derive(pest_derive::Parser)]
#[grammar = "classificator/classificator.pest"]
struct Grammar;

/// One node of the classification tree.
pub struct ClassifNode {
    name: String,
    drawable: bool,
    children: Vec<ClassifNode>,

    /// Trie over the children's names, mapping each to its declaration index.
    /// `None` for leaves.
    keyset: Option<DoubleArray<Vec<u8>>>,
}

/// A child node together with its sibling index, as returned by lookups.
#[derive(Copy, Clone)]
pub struct NodeRef<'t> {
    pub node: &'t ClassifNode,
    pub index: u32,
}

impl ClassifNode {
    fn new(name: String, drawable: bool, children: Vec<ClassifNode>) -> Result<Self, ClassifError> {
        if name.is_empty() {
            return Err(ClassifError::EmptyName);
        }
        if children.len() > code::MAX_INDEX as usize + 1 {
            return Err(ClassifError::TooManyChildren(name));
        }

        let keyset = if children.is_empty() {
            None
        } else {
            fn get_first<'t, 's>(tuple: &'t (&'s str, u32)) -> &'s str {
                tuple.0
            }

            let mut keyset: Vec<(&str, u32)> = children
                .iter()
                .enumerate()
                .map(|(index, child)| (child.name.as_str(), index as u32))
                .collect();
            keyset.sort_by_key(get_first);

            for window in keyset.windows(2) {
                if window[0].0 == window[1].0 {
                    return Err(ClassifError::DuplicateChild(window[0].0.to_string()));
                }
            }

            Some(DoubleArray::new(
                DoubleArrayBuilder::build(&keyset).ok_or(ClassifError::Trie)?,
            ))
        };

        Ok(ClassifNode {
            name,
            drawable,
            children,
            keyset,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_drawable(&self) -> bool {
        self.drawable
    }

    pub fn children(&self) -> &[ClassifNode] {
        &self.children
    }

    /// Look up a child by exact name.
    pub fn find(&self, name: &str) -> Option<NodeRef> {
        let index = self.keyset.as_ref()?.exact_match_search(name)?;
        Some(NodeRef {
            node: &self.children[index as usize],
            index,
        })
    }
}

/// The whole tree. Constructed via [`FromStr`].
pub struct ClassifTree {
    root: ClassifNode,
}

impl ClassifTree {
    pub fn root(&self) -> &ClassifNode {
        &self.root
    }

    /// Pack the type code for the node at `path`, if the path exists.
    pub fn type_by_path(&self, path: &[&str]) -> Option<u32> {
        let mut node = &self.root;
        let mut packed = code::empty();
        for name in path {
            let child = node.find(name)?;
            code::push(&mut packed, child.index);
            node = child.node;
        }
        Some(packed)
    }

    /// Decode a packed code back into its `a|b|c` path form.
    pub fn readable_name(&self, packed: u32) -> Option<String> {
        let depth = code::depth(packed);
        let mut node = &self.root;
        let mut parts = Vec::with_capacity(depth);
        for level in 0..depth {
            node = node.children.get(code::index_at(packed, level) as usize)?;
            parts.push(node.name.as_str());
        }
        Some(parts.join("|"))
    }

    /// Collect the packed codes of every node marked drawable.
    pub fn drawable_types(&self) -> HashSet<u32> {
        fn visit(node: &ClassifNode, packed: u32, out: &mut HashSet<u32>) {
            for (index, child) in node.children.iter().enumerate() {
                let mut packed = packed;
                code::push(&mut packed, index as u32);
                if child.drawable {
                    out.insert(packed);
                }
                visit(child, packed, out);
            }
        }

        let mut out = HashSet::new();
        visit(&self.root, code::empty(), &mut out);
        out
    }

    fn handle_node(pair: Pair<Rule>, depth: usize) -> Result<ClassifNode, ClassifError> {
        let mut name = String::new();
        let mut drawable = false;
        let mut children = Vec::new();

        for part in pair.into_inner() {
            match part.as_rule() {
                Rule::name => name = Self::handle_name(part)?,
                Rule::drawable => drawable = true,
                Rule::children => {
                    if depth == code::MAX_DEPTH {
                        return Err(ClassifError::TooDeep(name));
                    }
                    for child in part.into_inner() {
                        children.push(Self::handle_node(child, depth + 1)?);
                    }
                }
                invalid => {
                    return Err(ClassifError::InvalidRule(
                        invalid,
                        vec![Rule::name, Rule::drawable, Rule::children],
                    ))
                }
            }
        }

        ClassifNode::new(name, drawable, children)
    }

    fn handle_name(pair: Pair<Rule>) -> Result<String, ClassifError> {
        let inner = pair.into_inner().next().ok_or(ClassifError::MissingChild(Rule::name))?;
        Ok(match inner.as_rule() {
            Rule::ident => inner.as_str().to_string(),
            Rule::string => inner
                .into_inner()
                .next()
                .ok_or(ClassifError::MissingChild(Rule::string))?
                .as_str()
                .to_string(),
            invalid => {
                return Err(ClassifError::InvalidRule(
                    invalid,
                    vec![Rule::ident, Rule::string],
                ))
            }
        })
    }
}

impl FromStr for ClassifTree {
    type Err = ClassifError;

    fn from_str(definition: &str) -> Result<Self, ClassifError> {
        let mut matches = Grammar::parse(Rule::file, definition)?;
        let mut children = Vec::new();
        if let Some(file) = matches.next() {
            for pair in file.into_inner() {
                match pair.as_rule() {
                    Rule::node => children.push(Self::handle_node(pair, 1)?),
                    Rule::EOI => continue,
                    invalid => {
                        return Err(ClassifError::InvalidRule(
                            invalid,
                            vec![Rule::node, Rule::EOI],
                        ))
                    }
                }
            }
        }
        Ok(ClassifTree {
            root: ClassifNode::new("world".to_string(), false, children)?,
        })
    }
}

#[derive(Debug)]
pub enum ClassifError {
    /// A syntax error found by pest's parser
    Syntax(Box<pest::error::Error<Rule>>),

    /// A node has no name
    EmptyName,

    /// A node's children exceed the depth the type code packing supports
    TooDeep(String),

    /// A node has more children than one packed level can index
    TooManyChildren(String),

    /// Two siblings share a name
    DuplicateChild(String),

    /// The children keyset could not be built into a trie
    Trie,

    /// A type path required by the matcher's fixed rules is missing
    MissingType(String),

    /// A rule is missing a specific child, whose existence should be guaranteed by the grammar
    ///
    /// This is to be treated as a mistake in this library.
    MissingChild(Rule),

    /// A `ClassifTree::handle_*` function got a rule it can't handle
    ///
    /// This is to be treated as a mistake in this library.
    InvalidRule(Rule, Vec<Rule>),
}

impl From<pest::error::Error<Rule>> for ClassifError {
    fn from(error: pest::error::Error<Rule>) -> Self {
        Self::Syntax(Box::new(error))
    }
}

impl std::fmt::Display for ClassifError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ClassifError::Syntax(err) => err.fmt(f),
            ClassifError::EmptyName => write!(f, "A node's name may not be empty"),
            ClassifError::TooDeep(name) => {
                write!(f, "The children of \"{name}\" exceed the supported depth")
            }
            ClassifError::TooManyChildren(name) => {
                write!(f, "\"{name}\" has more children than one level can index")
            }
            ClassifError::DuplicateChild(name) => {
                write!(f, "The sibling name \"{name}\" appears twice")
            }
            ClassifError::Trie => write!(f, "Couldn't build trie"),
            ClassifError::MissingType(path) => {
                write!(f, "The tree is missing the required path \"{path}\"")
            }
            ClassifError::MissingChild(parent) => {
                writeln!(f, "This error should never happen! Please tell the maintainer!")?;
                write!(f, "Parent: {:?}", parent)
            }
            ClassifError::InvalidRule(got, exp) => {
                writeln!(f, "This error should never happen! Please tell the maintainer!")?;
                writeln!(f, "Got: {:?}", got)?;
                writeln!(f, "Expected one of:")?;
                for rule in exp {
                    writeln!(f, "- {:?}", rule)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn tree(definition: &str) -> ClassifTree {
        definition.parse().unwrap()
    }

    #[test]
    fn parse_forest() {
        let tree = tree(
            "highway * { primary * { bridge } secondary * }\n\
             railway { station * }",
        );
        assert_eq!(tree.root().children().len(), 2);

        let highway = tree.root().find("highway").unwrap();
        assert_eq!(highway.index, 0);
        assert!(highway.node.is_drawable());

        let primary = highway.node.find("primary").unwrap();
        assert_eq!(primary.node.children().len(), 1);
        assert!(!primary.node.find("bridge").unwrap().node.is_drawable());

        assert!(tree.root().find("waterway").is_none());
    }

    #[test]
    fn parse_comments_and_quoted_names() {
        let tree = tree(
            "# transit operators\n\
             network { \"London Underground\" * }",
        );
        let network = tree.root().find("network").unwrap();
        assert!(network.node.find("London Underground").is_some());
    }

    #[test]
    fn sibling_indices_follow_declaration_order() {
        let tree = tree("b { z y x }");
        let b = tree.root().find("b").unwrap().node;
        assert_eq!(b.find("z").unwrap().index, 0);
        assert_eq!(b.find("y").unwrap().index, 1);
        assert_eq!(b.find("x").unwrap().index, 2);
    }

    #[test]
    fn type_by_path_matches_manual_packing() {
        let tree = tree("a { b { c } } d");
        let mut expected = code::empty();
        code::push(&mut expected, 0);
        code::push(&mut expected, 0);
        code::push(&mut expected, 0);
        assert_eq!(tree.type_by_path(&["a", "b", "c"]), Some(expected));
        assert_eq!(tree.type_by_path(&["a", "c"]), None);
    }

    #[test]
    fn readable_name_round_trips() {
        let tree = tree("highway { primary { bridge } }");
        let packed = tree.type_by_path(&["highway", "primary", "bridge"]).unwrap();
        assert_eq!(tree.readable_name(packed).unwrap(), "highway|primary|bridge");
    }

    #[test]
    fn duplicate_siblings_are_rejected() {
        let result: Result<ClassifTree, _> = "a { b b }".parse();
        assert!(matches!(result, Err(ClassifError::DuplicateChild(name)) if name == "b"));
    }

    #[test]
    fn overdeep_trees_are_rejected() {
        let result: Result<ClassifTree, _> = "a { b { c { d { e } } } }".parse();
        assert!(matches!(result, Err(ClassifError::TooDeep(_))));
    }

    #[test]
    fn max_depth_itself_is_accepted() {
        let tree = tree("a { b { c { d } } }");
        assert!(tree.type_by_path(&["a", "b", "c", "d"]).is_some());
    }
}
