use super::{Validate, changed_text, required, required_text};
use crate::models::Goal;
use crate::types::ValidationErrors;
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::ToSchema;

const TITLE_MAX: usize = 100;
const DESCRIPTION_MAX: usize = 250;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreateGoalRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub target_date: Option<NaiveDate>,
    /// Defaults to `false`
    pub is_complete: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct NewGoal {
    pub title: String,
    pub description: String,
    pub target_date: NaiveDate,
    pub is_complete: bool,
}

impl Validate for CreateGoalRequest {
    type Valid = NewGoal;

    fn validate(self) -> Result<NewGoal, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let title = required_text(&mut errors, "title", self.title, TITLE_MAX);
        let description = required_text(&mut errors, "description", self.description, DESCRIPTION_MAX);
        let target_date = required(&mut errors, "target_date", self.target_date);

        match (title, description, target_date) {
            (Some(title), Some(description), Some(target_date)) if errors.is_empty() => Ok(NewGoal {
                title,
                description,
                target_date,
                is_complete: self.is_complete.unwrap_or(false),
            }),
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateGoalRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub target_date: Option<NaiveDate>,
    pub is_complete: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct GoalChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub target_date: Option<NaiveDate>,
    pub is_complete: Option<bool>,
}

impl GoalChanges {
    /// True when only the completion flag is being changed.
    pub fn only_completion(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.target_date.is_none()
    }

    pub fn apply(self, goal: &mut Goal) {
        if let Some(title) = self.title {
            goal.title = title;
        }
        if let Some(description) = self.description {
            goal.description = description;
        }
        if let Some(target_date) = self.target_date {
            goal.target_date = target_date;
        }
        if let Some(is_complete) = self.is_complete {
            goal.is_complete = is_complete;
        }
    }
}

impl Validate for UpdateGoalRequest {
    type Valid = GoalChanges;

    fn validate(self) -> Result<GoalChanges, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let changes = GoalChanges {
            title: changed_text(&mut errors, "title", self.title, TITLE_MAX),
            description: changed_text(&mut errors, "description", self.description, DESCRIPTION_MAX),
            target_date: self.target_date,
            is_complete: self.is_complete,
        };

        errors.into_result().map(|_| changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_goal_defaults_incomplete() {
        let goal = CreateGoalRequest {
            title: Some("Walk daily".into()),
            description: Some("30 minutes every morning".into()),
            target_date: NaiveDate::from_ymd_opt(2030, 1, 1),
            is_complete: None,
        }
        .validate()
        .expect("should validate");

        assert!(!goal.is_complete);
    }

    #[test]
    fn test_description_length_limit() {
        let errors = CreateGoalRequest {
            title: Some("Walk".into()),
            description: Some("x".repeat(DESCRIPTION_MAX + 1)),
            target_date: NaiveDate::from_ymd_opt(2030, 1, 1),
            is_complete: None,
        }
        .validate()
        .unwrap_err();

        assert!(errors.contains("description"));
    }

    #[test]
    fn test_only_completion() {
        let changes = UpdateGoalRequest {
            is_complete: Some(true),
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert!(changes.only_completion());

        let changes = UpdateGoalRequest {
            title: Some("Run".into()),
            is_complete: Some(true),
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert!(!changes.only_completion());
    }
}
