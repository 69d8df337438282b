use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub city: String,
    pub country: String,
    pub hobbies: Option<String>,

    pub academic_field_of_study: Option<String>,
    pub academic_institution: Option<String>,
    pub academic_graduation_year: Option<i32>,
    pub academic_degree: Option<String>,

    pub professional_job_title: Option<String>,
    pub professional_company_name: Option<String>,
    pub professional_years_of_experience: Option<u32>,
    pub professional_skills: Option<String>,

    pub startup_project_name: Option<String>,
    pub startup_mission: Option<String>,
    pub startup_problem_statement: Option<String>,
    pub startup_solution: Option<String>,
    pub startup_impact: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Profile payload for create and update. Every field is optional here; the
/// create path checks the required ones. Unknown keys are rejected.
#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct ProfileInput {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[serde(deserialize_with = "deserialize_optional_date")]
    pub date_of_birth: Option<NaiveDate>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub hobbies: Option<String>,

    pub academic_field_of_study: Option<String>,
    pub academic_institution: Option<String>,
    pub academic_graduation_year: Option<i32>,
    pub academic_degree: Option<String>,

    pub professional_job_title: Option<String>,
    pub professional_company_name: Option<String>,
    pub professional_years_of_experience: Option<u32>,
    pub professional_skills: Option<String>,

    pub startup_project_name: Option<String>,
    pub startup_mission: Option<String>,
    pub startup_problem_statement: Option<String>,
    pub startup_solution: Option<String>,
    pub startup_impact: Option<String>,
}

// Accepts a plain calendar date or a full RFC 3339 timestamp.
fn deserialize_optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    let Some(raw) = raw else {
        return Ok(None);
    };

    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(Some(date));
    }

    DateTime::parse_from_rfc3339(raw)
        .map(|ts| Some(ts.with_timezone(&Utc).date_naive()))
        .map_err(|_| serde::de::Error::custom(format!("invalid date: {}", raw)))
}

fn present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

impl ProfileInput {
    /// True when the payload carries no field at all.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Names of required fields that are absent or blank.
    pub fn missing_required(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if !present(&self.first_name) {
            missing.push("firstName");
        }
        if !present(&self.last_name) {
            missing.push("lastName");
        }
        if self.date_of_birth.is_none() {
            missing.push("dateOfBirth");
        }
        if !present(&self.city) {
            missing.push("city");
        }
        if !present(&self.country) {
            missing.push("country");
        }
        missing
    }

    /// Required fields supplied on update must not be blanked out.
    pub fn blanked_required(&self) -> Vec<&'static str> {
        let blank = |value: &Option<String>| value.as_deref().is_some_and(|v| v.trim().is_empty());

        [
            ("firstName", &self.first_name),
            ("lastName", &self.last_name),
            ("city", &self.city),
            ("country", &self.country),
        ]
        .into_iter()
        .filter(|(_, value)| blank(value))
        .map(|(name, _)| name)
        .collect()
    }
}

impl Profile {
    /// Builds a new profile from a create payload. Returns the missing
    /// required field names when the payload is incomplete.
    pub fn from_input(user_id: &str, input: ProfileInput) -> Result<Self, Vec<&'static str>> {
        let missing = input.missing_required();
        if !missing.is_empty() {
            return Err(missing);
        }

        let (Some(first_name), Some(last_name), Some(date_of_birth), Some(city), Some(country)) = (
            input.first_name,
            input.last_name,
            input.date_of_birth,
            input.city,
            input.country,
        ) else {
            return Err(vec!["firstName", "lastName", "dateOfBirth", "city", "country"]);
        };

        let now = Utc::now();
        Ok(Self {
            user_id: user_id.to_string(),
            first_name: first_name.trim().to_string(),
            last_name: last_name.trim().to_string(),
            date_of_birth,
            city: city.trim().to_string(),
            country: country.trim().to_string(),
            hobbies: input.hobbies,
            academic_field_of_study: input.academic_field_of_study,
            academic_institution: input.academic_institution,
            academic_graduation_year: input.academic_graduation_year,
            academic_degree: input.academic_degree,
            professional_job_title: input.professional_job_title,
            professional_company_name: input.professional_company_name,
            professional_years_of_experience: input.professional_years_of_experience,
            professional_skills: input.professional_skills,
            startup_project_name: input.startup_project_name,
            startup_mission: input.startup_mission,
            startup_problem_statement: input.startup_problem_statement,
            startup_solution: input.startup_solution,
            startup_impact: input.startup_impact,
            created_at: now,
            updated_at: now,
        })
    }

    /// Overwrites every field present in `input` and bumps `updated_at`.
    pub fn apply(&mut self, input: ProfileInput) {
        fn merge<T>(target: &mut T, value: Option<T>) {
            if let Some(value) = value {
                *target = value;
            }
        }

        fn merge_opt<T>(target: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *target = value;
            }
        }

        merge(&mut self.first_name, input.first_name.map(|v| v.trim().to_string()));
        merge(&mut self.last_name, input.last_name.map(|v| v.trim().to_string()));
        merge(&mut self.date_of_birth, input.date_of_birth);
        merge(&mut self.city, input.city.map(|v| v.trim().to_string()));
        merge(&mut self.country, input.country.map(|v| v.trim().to_string()));
        merge_opt(&mut self.hobbies, input.hobbies);

        merge_opt(&mut self.academic_field_of_study, input.academic_field_of_study);
        merge_opt(&mut self.academic_institution, input.academic_institution);
        merge_opt(&mut self.academic_graduation_year, input.academic_graduation_year);
        merge_opt(&mut self.academic_degree, input.academic_degree);

        merge_opt(&mut self.professional_job_title, input.professional_job_title);
        merge_opt(&mut self.professional_company_name, input.professional_company_name);
        merge_opt(
            &mut self.professional_years_of_experience,
            input.professional_years_of_experience,
        );
        merge_opt(&mut self.professional_skills, input.professional_skills);

        merge_opt(&mut self.startup_project_name, input.startup_project_name);
        merge_opt(&mut self.startup_mission, input.startup_mission);
        merge_opt(&mut self.startup_problem_statement, input.startup_problem_statement);
        merge_opt(&mut self.startup_solution, input.startup_solution);
        merge_opt(&mut self.startup_impact, input.startup_impact);

        self.updated_at = Utc::now();
    }
}
