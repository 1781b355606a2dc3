// src/manifest/organization.rs

//! Organization tree built from `<organizations>`

use super::xml::XmlElement;

/// An `<item>` of the organization tree
///
/// Items without a resource reference are structural: modules at the top
/// level, sub-headers (or standalone sub-modules) below it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrganizationItem {
    pub identifier: String,
    pub identifierref: Option<String>,
    pub title: String,
    pub children: Vec<OrganizationItem>,
}

impl OrganizationItem {
    /// True when the item references a resource
    pub fn is_leaf_resource(&self) -> bool {
        self.identifierref.is_some()
    }

    fn from_element(node: &XmlElement) -> Self {
        Self {
            identifier: node.attr("identifier").unwrap_or_default().to_string(),
            identifierref: node
                .attr("identifierref")
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(str::to_string),
            title: node
                .child("title")
                .map(|t| t.text().trim().to_string())
                .unwrap_or_default(),
            children: node
                .children_named("item")
                .map(Self::from_element)
                .collect(),
        }
    }

    /// Every resource referenced in this subtree, in document order
    pub fn referenced_resources(&self) -> Vec<&str> {
        let mut refs = Vec::new();
        self.collect_refs(&mut refs);
        refs
    }

    fn collect_refs<'a>(&'a self, out: &mut Vec<&'a str>) {
        if let Some(r) = &self.identifierref {
            out.push(r);
        }
        for child in &self.children {
            child.collect_refs(out);
        }
    }
}

/// Top-level items of every organization
///
/// Organizations are rooted hierarchies: the single `<item>` directly under
/// `<organization>` is a container whose children are the course's
/// top-level items. A missing or empty `<organizations>` yields no items.
pub fn parse_organizations(manifest: &XmlElement) -> Vec<OrganizationItem> {
    let Some(organizations) = manifest.child("organizations") else {
        return Vec::new();
    };

    organizations
        .children_named("organization")
        .flat_map(|org| org.children_named("item"))
        .flat_map(|root| root.children_named("item"))
        .map(OrganizationItem::from_element)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::xml::parse_document;

    const ORGS: &str = r#"
        <manifest>
          <organizations>
            <organization structure="rooted-hierarchy" identifier="org_1">
              <item identifier="LearningModules">
                <item identifier="m1">
                  <title>some module</title>
                  <item identifier="ct2" identifierref="w1">
                    <title>some page</title>
                  </item>
                </item>
                <item identifier="ct5" identifierref="f3">
                  <title>Super exciting!</title>
                </item>
                <item identifier="m2">
                  <title>next module</title>
                </item>
              </item>
            </organization>
          </organizations>
        </manifest>"#;

    #[test]
    fn test_rooted_hierarchy_children_are_top_level() {
        let doc = parse_document(ORGS).unwrap();
        let items = parse_organizations(&doc);

        let ids: Vec<_> = items.iter().map(|i| i.identifier.as_str()).collect();
        assert_eq!(ids, vec!["m1", "ct5", "m2"]);
        assert!(!items[0].is_leaf_resource());
        assert!(items[1].is_leaf_resource());
        assert_eq!(items[0].children[0].title, "some page");
        assert_eq!(items[0].referenced_resources(), vec!["w1"]);
    }

    #[test]
    fn test_missing_organizations_is_empty() {
        let doc = parse_document("<manifest><resources/></manifest>").unwrap();
        assert!(parse_organizations(&doc).is_empty());

        let doc = parse_document("<manifest><organizations/></manifest>").unwrap();
        assert!(parse_organizations(&doc).is_empty());
    }
}
