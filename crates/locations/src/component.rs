use serde::{Deserialize, Serialize};

use skillsgarden_core::validation::{check_length, check_length_opt};
use skillsgarden_core::{ComponentId, DomainResult, Entity, ExerciseId, LocationId};

/// A piece of equipment at a location, linked to the exercises it supports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    pub id: ComponentId,
    pub location_id: LocationId,
    pub name: String,
    pub description: String,
    pub image: String,
    pub exercises: Vec<ExerciseId>,
}

impl Entity for Component {
    type Id = ComponentId;

    fn id(&self) -> ComponentId {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComponent {
    pub location_id: LocationId,
    pub name: String,
    pub description: String,
    pub image: String,
    pub exercises: Vec<ExerciseId>,
}

impl NewComponent {
    pub fn validate(&self) -> DomainResult<()> {
        check_length("Name", &self.name, 2, 50)?;
        check_length("Description", &self.description, 2, 500)?;
        Ok(())
    }
}

/// Partial update. `exercises`, when present, replaces the whole link set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub exercises: Option<Vec<ExerciseId>>,
}

impl ComponentPatch {
    pub fn validate(&self) -> DomainResult<()> {
        check_length_opt("Name", self.name.as_deref(), 2, 50)?;
        check_length_opt("Description", self.description.as_deref(), 2, 500)?;
        Ok(())
    }

    pub fn apply(&self, component: &mut Component) {
        if let Some(v) = &self.name {
            component.name = v.clone();
        }
        if let Some(v) = &self.description {
            component.description = v.clone();
        }
        if let Some(v) = &self.image {
            component.image = v.clone();
        }
        if let Some(v) = &self.exercises {
            component.exercises = dedup_ids(v);
        }
    }
}

/// Drop repeated ids, keeping first occurrences in order.
pub fn dedup_ids(ids: &[ExerciseId]) -> Vec<ExerciseId> {
    let mut out: Vec<ExerciseId> = Vec::with_capacity(ids.len());
    for id in ids {
        if !out.contains(id) {
            out.push(*id);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn description_limit_is_500() {
        let c = NewComponent {
            location_id: LocationId::new(1),
            name: "Rekstok".into(),
            description: "d".repeat(500),
            image: "x.png".into(),
            exercises: vec![],
        };
        assert!(c.validate().is_ok());

        let too_long = NewComponent { description: "d".repeat(501), ..c };
        assert_eq!(
            too_long.validate().unwrap_err().to_string(),
            "Description can not be longer than 500 characters"
        );
    }

    #[test]
    fn exercise_links_replaced_without_duplicates() {
        let mut c = Component {
            id: ComponentId::new(1),
            location_id: LocationId::new(1),
            name: "Rekstok".into(),
            description: "Bar".into(),
            image: "x.png".into(),
            exercises: vec![ExerciseId::new(1)],
        };
        let patch = ComponentPatch {
            exercises: Some(vec![ExerciseId::new(3), ExerciseId::new(2), ExerciseId::new(3)]),
            ..Default::default()
        };
        patch.apply(&mut c);
        assert_eq!(c.exercises, vec![ExerciseId::new(3), ExerciseId::new(2)]);
        assert_eq!(c.name, "Rekstok");
    }
}
