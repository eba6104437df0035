//! Instance graph over a parsed DATA section.

use std::collections::HashMap;

use super::p21::{EntityInstance, StepValue};

/// Instances indexed by ID and by type name.
#[derive(Debug, Default)]
pub struct IfcGraph {
    instances: HashMap<u64, EntityInstance>,
    by_type: HashMap<String, Vec<u64>>,
}

impl IfcGraph {
    pub fn new(instances: Vec<EntityInstance>) -> Self {
        let mut by_type: HashMap<String, Vec<u64>> = HashMap::new();
        for instance in &instances {
            by_type
                .entry(instance.type_name.clone())
                .or_default()
                .push(instance.id);
        }
        for ids in by_type.values_mut() {
            ids.sort_unstable();
            ids.dedup();
        }

        let instances = instances.into_iter().map(|i| (i.id, i)).collect();
        Self { instances, by_type }
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn get(&self, id: u64) -> Option<&EntityInstance> {
        self.instances.get(&id)
    }

    /// Get an instance only if it has the given (upper-case) type.
    pub fn get_typed(&self, id: u64, type_name: &str) -> Option<&EntityInstance> {
        self.get(id).filter(|i| i.type_name == type_name)
    }

    /// Follow a reference parameter.
    pub fn resolve(&self, value: Option<&StepValue>) -> Option<&EntityInstance> {
        self.get(value?.as_reference()?)
    }

    /// IDs of all instances of a type, ascending.
    pub fn find_by_type(&self, type_name: &str) -> &[u64] {
        self.by_type
            .get(type_name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Coordinates of an `IFCCARTESIANPOINT`; only 3D points qualify.
    pub fn point(&self, id: u64) -> Option<[f64; 3]> {
        let point = self.get_typed(id, "IFCCARTESIANPOINT")?;
        match numbers(point.param(0)?)?.as_slice() {
            &[x, y, z] => Some([x, y, z]),
            _ => None,
        }
    }

    /// Direction ratios of an `IFCDIRECTION`, as written.
    pub fn direction(&self, id: u64) -> Option<Vec<f64>> {
        let direction = self.get_typed(id, "IFCDIRECTION")?;
        numbers(direction.param(0)?)
    }
}

fn numbers(value: &StepValue) -> Option<Vec<f64>> {
    value.as_list()?.iter().map(StepValue::as_f64).collect()
}

#[cfg(test)]
mod tests {
    use super::super::p21::parse_data_section;
    use super::*;

    fn graph(data: &str) -> IfcGraph {
        let (_, instances) = parse_data_section(data).unwrap();
        IfcGraph::new(instances)
    }

    #[test]
    fn test_points_and_directions() {
        let g = graph(
            "DATA;
#1=IFCCARTESIANPOINT((1.,2.,3.));
#2=IFCCARTESIANPOINT((1.,2.));
#3=IFCDIRECTION((0.,0.,2.));
#4=IFCDIRECTION((1,0));
ENDSEC;",
        );
        assert_eq!(g.len(), 4);
        assert_eq!(g.point(1), Some([1.0, 2.0, 3.0]));
        assert_eq!(g.point(2), None);
        assert_eq!(g.point(3), None);
        assert_eq!(g.direction(3), Some(vec![0.0, 0.0, 2.0]));
        assert_eq!(g.direction(4), Some(vec![1.0, 0.0]));
    }

    #[test]
    fn test_find_by_type_is_sorted() {
        let g = graph(
            "DATA;
#9=IFCBEAM('b',$,$,$,$,$,$,$);
#2=IFCBEAM('a',$,$,$,$,$,$,$);
#5=IFCWALL('w',$,$,$,$,$,$,$);
ENDSEC;",
        );
        assert_eq!(g.find_by_type("IFCBEAM"), &[2, 9]);
        assert!(g.find_by_type("IFCPLATE").is_empty());
        assert!(g.get_typed(5, "IFCBEAM").is_none());
    }
}
