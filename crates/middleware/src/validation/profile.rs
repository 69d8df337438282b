use app_error::{AppError, AppResult, messages};
use app_models::ProfileInput;
use chrono::{Datelike, Utc};

const MAX_TEXT_LENGTH: usize = 2000;

/// Shape checks shared by create and update. Required-field checks for
/// create happen when the profile is built.
pub fn validate_profile_input(input: &ProfileInput) -> AppResult<()> {
    if input.is_empty() {
        return Err(AppError::validation(messages::PROFILE_DATA_EMPTY));
    }

    let blanked = input.blanked_required();
    if !blanked.is_empty() {
        return Err(AppError::validation(format!(
            "Fields cannot be blank: {}",
            blanked.join(", ")
        )));
    }

    let texts = [
        &input.first_name,
        &input.last_name,
        &input.city,
        &input.country,
        &input.hobbies,
        &input.academic_field_of_study,
        &input.academic_institution,
        &input.academic_degree,
        &input.professional_job_title,
        &input.professional_company_name,
        &input.professional_skills,
        &input.startup_project_name,
        &input.startup_mission,
        &input.startup_problem_statement,
        &input.startup_solution,
        &input.startup_impact,
    ];
    if texts
        .iter()
        .filter_map(|value| value.as_deref())
        .any(|value| value.chars().count() > MAX_TEXT_LENGTH)
    {
        return Err(AppError::validation(format!(
            "Profile fields cannot exceed {} characters",
            MAX_TEXT_LENGTH
        )));
    }

    let this_year = Utc::now().year();
    if let Some(year) = input.academic_graduation_year {
        if !(1900..=this_year + 10).contains(&year) {
            return Err(AppError::validation("Invalid graduation year"));
        }
    }

    if let Some(date) = input.date_of_birth {
        if date > Utc::now().date_naive() {
            return Err(AppError::validation("Date of birth cannot be in the future"));
        }
    }

    Ok(())
}
