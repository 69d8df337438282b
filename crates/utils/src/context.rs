use app_models::Profile;

fn text(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Renders a first-person summary of a profile, one sentence group per line.
/// Blank fields are treated as absent.
pub fn build_profile_context(profile: &Profile) -> String {
    let mut lines = vec![
        format!("My name is {} {}.", profile.first_name.trim(), profile.last_name.trim()),
        format!(
            "I was born on {} and currently live in {}, {}.",
            profile.date_of_birth.format("%a %b %d %Y"),
            profile.city.trim(),
            profile.country.trim()
        ),
    ];

    if let Some(hobbies) = text(&profile.hobbies) {
        lines.push(format!("My hobbies include {}.", hobbies));
    }

    if let Some(line) = academic_line(profile) {
        lines.push(line);
    }

    lines.extend(professional_lines(profile));
    lines.extend(startup_lines(profile));

    lines.join("\n")
}

fn academic_line(profile: &Profile) -> Option<String> {
    let field = text(&profile.academic_field_of_study);
    let institution = text(&profile.academic_institution);
    let degree = text(&profile.academic_degree);

    if field.is_none() && institution.is_none() && degree.is_none() {
        return None;
    }

    let mut line = String::from("Academically, I");
    if let Some(field) = field {
        line.push_str(&format!(" studied {}", field));
    }
    if let Some(institution) = institution {
        line.push_str(&format!(" at {}", institution));
    }
    if let Some(year) = profile.academic_graduation_year {
        line.push_str(&format!(" and graduated in {}", year));
    }
    if let Some(degree) = degree {
        line.push_str(&format!(" with a degree in {}", degree));
    }
    line.push('.');

    Some(line)
}

fn professional_lines(profile: &Profile) -> Vec<String> {
    let title = text(&profile.professional_job_title);
    let company = text(&profile.professional_company_name);
    let years = profile.professional_years_of_experience;
    let skills = text(&profile.professional_skills);

    if title.is_none() && company.is_none() && years.is_none() && skills.is_none() {
        return Vec::new();
    }

    let mut line = String::from("Professionally, I");
    if let Some(title) = title {
        line.push_str(&format!(" worked as {}", title));
    }
    if let Some(company) = company {
        line.push_str(&format!(" at {}", company));
    }
    if let Some(years) = years {
        let unit = if years == 1 { "year" } else { "years" };
        line.push_str(&format!(" with {} {} of experience", years, unit));
    }
    line.push('.');

    let mut lines = vec![line];
    if let Some(skills) = skills {
        lines.push(format!("My key skills include: {}.", skills));
    }
    lines
}

fn startup_lines(profile: &Profile) -> Vec<String> {
    [
        text(&profile.startup_project_name)
            .map(|name| format!("I worked on a startup project called \"{}\".", name)),
        text(&profile.startup_mission).map(|mission| format!("Its mission was: {}", mission)),
        text(&profile.startup_problem_statement)
            .map(|problem| format!("It addresses the problem: {}", problem)),
        text(&profile.startup_solution)
            .map(|solution| format!("The proposed solution was: {}", solution)),
        text(&profile.startup_impact).map(|impact| format!("Impact of the project: {}", impact)),
    ]
    .into_iter()
    .flatten()
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use app_models::ProfileInput;
    use chrono::NaiveDate;

    fn base_profile() -> Profile {
        let input = ProfileInput {
            first_name: Some("Ada".into()),
            last_name: Some("Lovelace".into()),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 15),
            city: Some("London".into()),
            country: Some("UK".into()),
            ..Default::default()
        };
        Profile::from_input("user-1", input).unwrap()
    }

    #[test]
    fn test_required_fields_only() {
        let context = build_profile_context(&base_profile());
        let lines: Vec<&str> = context.lines().collect();

        assert_eq!(
            lines,
            vec![
                "My name is Ada Lovelace.",
                "I was born on Mon Jan 15 1990 and currently live in London, UK.",
            ]
        );
    }

    #[test]
    fn test_years_of_experience_wording() {
        let mut profile = base_profile();

        profile.professional_years_of_experience = Some(1);
        assert!(build_profile_context(&profile).contains("with 1 year of experience."));

        profile.professional_years_of_experience = Some(2);
        assert!(build_profile_context(&profile).contains("with 2 years of experience."));

        profile.professional_years_of_experience = Some(0);
        assert!(build_profile_context(&profile).contains("Professionally, I with 0 years of experience."));
    }

    #[test]
    fn test_full_profile() {
        let mut profile = base_profile();
        profile.hobbies = Some("chess, hiking".into());
        profile.academic_field_of_study = Some("Mathematics".into());
        profile.academic_institution = Some("UCL".into());
        profile.academic_graduation_year = Some(2012);
        profile.academic_degree = Some("BSc".into());
        profile.professional_job_title = Some("Engineer".into());
        profile.professional_company_name = Some("Acme".into());
        profile.professional_years_of_experience = Some(5);
        profile.professional_skills = Some("Rust, SQL".into());
        profile.startup_project_name = Some("Engine".into());
        profile.startup_mission = Some("Compute everything".into());
        profile.startup_impact = Some("Large".into());

        let context = build_profile_context(&profile);
        let lines: Vec<&str> = context.lines().collect();

        assert_eq!(lines[2], "My hobbies include chess, hiking.");
        assert_eq!(
            lines[3],
            "Academically, I studied Mathematics at UCL and graduated in 2012 with a degree in BSc."
        );
        assert_eq!(
            lines[4],
            "Professionally, I worked as Engineer at Acme with 5 years of experience."
        );
        assert_eq!(lines[5], "My key skills include: Rust, SQL.");
        assert_eq!(lines[6], "I worked on a startup project called \"Engine\".");
        assert_eq!(lines[7], "Its mission was: Compute everything");
        assert_eq!(lines[8], "Impact of the project: Large");
        assert_eq!(lines.len(), 9);
    }

    #[test]
    fn test_blank_strings_are_absent() {
        let mut profile = base_profile();
        profile.hobbies = Some("   ".into());
        profile.academic_degree = Some("".into());
        profile.startup_mission = Some("\t".into());

        assert_eq!(build_profile_context(&profile).lines().count(), 2);
    }

    #[test]
    fn test_graduation_year_alone_does_not_open_academic_line() {
        let mut profile = base_profile();
        profile.academic_graduation_year = Some(2012);
        assert_eq!(build_profile_context(&profile).lines().count(), 2);
    }
}
