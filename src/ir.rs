use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

/// A single cloud entity as delivered by acquisition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub depends_on: Vec<String>,
    #[serde(default)]
    pub properties: ResourceProperties,
}

/// Properties the diagram policies know how to read. Anything else lands in
/// `tags`, which keeps every value a key was seen with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceProperties {
    pub attached_to: Option<String>,
    pub size: Option<String>,
    pub storage_account_name: Option<String>,
    pub outbound_subnet: Option<String>,
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, Vec<String>>,
}

impl Resource {
    pub fn new(id: &str, kind: &str) -> Self {
        Self {
            id: id.to_string(),
            kind: kind.to_string(),
            name: id.to_string(),
            depends_on: Vec::new(),
            properties: ResourceProperties::default(),
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn depends_on(mut self, id: &str) -> Self {
        self.depends_on.push(id.to_string());
        self
    }

    pub fn attached_to(mut self, id: &str) -> Self {
        self.properties.attached_to = Some(id.to_string());
        self
    }

    /// Label shown under the shape; falls back to the last path segment of
    /// the id when the record carries no display name.
    pub fn display_name(&self) -> &str {
        if !self.name.trim().is_empty() {
            return self.name.as_str();
        }
        self.id.rsplit('/').next().unwrap_or(self.id.as_str())
    }
}

pub fn normalize_id(id: &str) -> String {
    id.trim().to_lowercase()
}

/// Case-normalizes ids, keeps the first record of every id and drops
/// dependencies that point at nothing in the set. Input order is preserved.
pub fn normalize_resources(resources: Vec<Resource>) -> Vec<Resource> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::with_capacity(resources.len());
    for mut resource in resources {
        resource.id = normalize_id(&resource.id);
        resource.kind = resource.kind.trim().to_lowercase();
        if let Some(target) = resource.properties.attached_to.as_mut() {
            *target = normalize_id(target);
        }
        if let Some(subnet) = resource.properties.outbound_subnet.as_mut() {
            *subnet = normalize_id(subnet);
        }
        if !seen.insert(resource.id.clone()) {
            tracing::warn!(id = %resource.id, "duplicate resource id, keeping first record");
            continue;
        }
        out.push(resource);
    }
    filter_dangling_dependencies(&mut out);
    out
}

/// Removes dependency ids that are absent from `resources`, self-references
/// and repeated ids. Normalizes the remaining ones.
pub fn filter_dangling_dependencies(resources: &mut [Resource]) {
    let known: HashSet<String> = resources.iter().map(|r| r.id.clone()).collect();
    for resource in resources.iter_mut() {
        let mut kept: Vec<String> = Vec::with_capacity(resource.depends_on.len());
        for dep in resource.depends_on.drain(..) {
            let dep = normalize_id(&dep);
            if dep == resource.id || kept.contains(&dep) {
                continue;
            }
            if !known.contains(&dep) {
                tracing::debug!(id = %resource.id, dependency = %dep, "dropping dangling dependency");
                continue;
            }
            kept.push(dep);
        }
        resource.depends_on = kept;
    }
}
