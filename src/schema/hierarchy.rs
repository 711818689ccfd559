use indexmap::IndexMap;

use crate::{domain::FieldDefinition, path::normalize};

/// One level of the field tree. Children are keyed by their normalized dotted segment, so
/// `[item]` never introduces a level of its own: it belongs to the array field's node.
#[derive(Debug, Clone, Default)]
pub struct FieldNode {
    pub segment: String,
    /// Template path of this node (the definition's key once one is attached).
    pub path: String,
    pub definition: Option<FieldDefinition>,
    pub children: IndexMap<String, FieldNode>,
    pub is_leaf: bool,
}

impl FieldNode {
    fn group(segment: String, path: String) -> Self {
        Self {
            segment,
            path,
            ..Self::default()
        }
    }

    pub fn is_root(&self) -> bool {
        self.segment.is_empty()
    }

    pub fn is_container(&self) -> bool {
        !self.children.is_empty()
            || self
                .definition
                .as_ref()
                .is_some_and(FieldDefinition::is_complex)
    }

    pub fn children(&self) -> impl Iterator<Item = &FieldNode> {
        self.children.values()
    }

    /// Node at `path`, which may be given in any flavor; placeholders and indices are ignored.
    pub fn get(&self, path: &str) -> Option<&FieldNode> {
        let plain = normalize(path);
        if plain.is_empty() {
            return Some(self);
        }
        plain
            .split('.')
            .try_fold(self, |node, segment| node.children.get(segment))
    }

    /// Pre-order traversal; `depth` is 0 for the root's children.
    pub fn walk(&self, visit: &mut impl FnMut(&FieldNode, usize)) {
        for child in self.children.values() {
            child.walk_at(0, visit);
        }
    }

    fn walk_at(&self, depth: usize, visit: &mut impl FnMut(&FieldNode, usize)) {
        visit(self, depth);
        for child in self.children.values() {
            child.walk_at(depth + 1, visit);
        }
    }

    /// Number of nodes below this one.
    pub fn descendant_count(&self) -> usize {
        self.children
            .values()
            .map(|child| 1 + child.descendant_count())
            .sum()
    }

    fn finalize(&mut self) {
        for child in self.children.values_mut() {
            child.finalize();
        }
        self.is_leaf = self.definition.is_some() && self.children.is_empty();
    }
}

/// Build the field tree from flattened definitions (fully qualified keys, containers included).
///
/// Children keep first-seen order, so the same input order always yields the same tree.
pub fn build_hierarchy<'a>(fields: impl IntoIterator<Item = &'a FieldDefinition>) -> FieldNode {
    let mut root = FieldNode::default();
    for definition in fields {
        let mut node = &mut root;
        let mut template = String::new();
        for dotted in definition.key.split('.') {
            if !template.is_empty() {
                template.push('.');
            }
            template.push_str(dotted);
            let segment = normalize(dotted);
            if segment.is_empty() {
                continue;
            }
            node = node
                .children
                .entry(segment.clone())
                .or_insert_with(|| FieldNode::group(segment, template.clone()));
        }
        if node.is_root() {
            continue;
        }
        node.path = definition.key.clone();
        node.definition = Some(definition.clone());
    }
    root.finalize();
    root
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{FieldDefinition, FieldType},
        schema::flatten,
    };

    #[test]
    fn groups_shared_prefixes() {
        let definitions = vec![
            FieldDefinition::new("a.b", "B", FieldType::Text),
            FieldDefinition::new("a.c", "C", FieldType::Text),
            FieldDefinition::new("d", "D", FieldType::Text),
        ];
        let flat = flatten(&definitions).unwrap();
        let root = build_hierarchy(flat.values());

        assert_eq!(root.children.len(), 2);
        let a = root.get("a").unwrap();
        assert!(!a.is_leaf);
        assert!(a.definition.is_none());
        let names: Vec<&str> = a.children().map(|n| n.segment.as_str()).collect();
        assert_eq!(names, vec!["b", "c"]);
        assert!(a.children().all(|n| n.is_leaf));
        assert!(root.get("d").unwrap().is_leaf);
    }

    #[test]
    fn placeholders_do_not_add_levels() {
        let definitions = vec![FieldDefinition::array(
            "materialList",
            "Materials",
            vec![
                FieldDefinition::new("country", "Country", FieldType::Text),
                FieldDefinition::new("share", "Share", FieldType::Number),
            ],
        )];
        let flat = flatten(&definitions).unwrap();
        let root = build_hierarchy(flat.values());

        let list = root.get("materialList").unwrap();
        assert_eq!(list.path, "materialList");
        assert!(list.is_container());
        assert!(!list.is_leaf);
        assert_eq!(list.children.len(), 2);
        let country = root.get("materialList[4].country").unwrap();
        assert_eq!(country.path, "materialList[item].country");
        assert!(country.is_leaf);
    }

    #[test]
    fn walk_visits_in_declaration_order() {
        let definitions = vec![
            FieldDefinition::new("z", "Z", FieldType::Text),
            FieldDefinition::object(
                "m",
                "M",
                vec![FieldDefinition::new("x", "X", FieldType::Text)],
            ),
            FieldDefinition::new("a", "A", FieldType::Text),
        ];
        let flat = flatten(&definitions).unwrap();
        let root = build_hierarchy(flat.values());
        let mut seen = Vec::new();
        root.walk(&mut |node, depth| seen.push((node.path.clone(), depth)));
        assert_eq!(
            seen,
            vec![
                ("z".to_string(), 0),
                ("m".to_string(), 0),
                ("m.x".to_string(), 1),
                ("a".to_string(), 0),
            ]
        );
        assert_eq!(root.descendant_count(), 4);
    }
}
