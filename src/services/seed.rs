use crate::models::College;

#[allow(clippy::too_many_arguments)]
fn seed(
    name: &str,
    location: &str,
    ranking: u32,
    tuition: u64,
    acceptance_rate: f64,
    avg_sat: u32,
    avg_gpa: f64,
    majors: &[&str],
    description: &str,
) -> College {
    College {
        ranking: Some(ranking),
        tuition: Some(tuition),
        acceptance_rate: Some(acceptance_rate),
        avg_sat: Some(avg_sat),
        avg_gpa: Some(avg_gpa),
        majors: majors.iter().map(|m| m.to_string()).collect(),
        description: description.to_string(),
        ..College::new(name, location)
    }
}

/// Built-in college records used when live search yields nothing usable
///
/// Tuition figures are annual and approximate (in-state for public schools).
pub fn seed_colleges() -> Vec<College> {
    vec![
        seed(
            "Massachusetts Institute of Technology",
            "Cambridge, Massachusetts",
            2,
            57986,
            0.04,
            1550,
            3.97,
            &["Computer Science", "Electrical Engineering", "Mechanical Engineering", "Physics"],
            "World leader in engineering, computing and physical science research.",
        ),
        seed(
            "Stanford University",
            "Stanford, California",
            3,
            58416,
            0.04,
            1540,
            3.96,
            &["Computer Science", "Engineering", "Economics", "Human Biology"],
            "Silicon Valley research university with strong ties to the tech industry.",
        ),
        seed(
            "Harvard University",
            "Cambridge, Massachusetts",
            3,
            54269,
            0.03,
            1540,
            3.95,
            &["Economics", "Government", "Biology", "History"],
            "Oldest university in the United States, known for law, medicine and business.",
        ),
        seed(
            "Carnegie Mellon University",
            "Pittsburgh, Pennsylvania",
            24,
            59864,
            0.11,
            1535,
            3.91,
            &["Computer Science", "Robotics", "Information Systems", "Drama"],
            "Top-ranked school of computer science and robotics.",
        ),
        seed(
            "New York University",
            "New York, New York",
            35,
            58168,
            0.12,
            1510,
            3.71,
            &["Business", "Film", "Economics", "Nursing"],
            "Urban campus in Manhattan with strong business and arts programs.",
        ),
        seed(
            "University of California, Berkeley",
            "Berkeley, California",
            15,
            14312,
            0.11,
            1430,
            3.90,
            &["Computer Science", "Electrical Engineering", "Business", "Chemistry"],
            "Flagship public research university of the University of California system.",
        ),
        seed(
            "University of Michigan",
            "Ann Arbor, Michigan",
            21,
            15948,
            0.18,
            1435,
            3.90,
            &["Engineering", "Business", "Economics", "Psychology"],
            "Large public research university with a strong engineering college.",
        ),
        seed(
            "Georgia Institute of Technology",
            "Atlanta, Georgia",
            33,
            12682,
            0.17,
            1450,
            3.93,
            &["Computer Science", "Industrial Engineering", "Aerospace Engineering"],
            "Public technology institute known for engineering and computing.",
        ),
        seed(
            "University of Texas at Austin",
            "Austin, Texas",
            32,
            11448,
            0.31,
            1355,
            3.83,
            &["Engineering", "Business", "Communications", "Nursing"],
            "Flagship public university of Texas with top business and engineering programs.",
        ),
        seed(
            "University of Washington",
            "Seattle, Washington",
            40,
            12076,
            0.48,
            1400,
            3.80,
            &["Computer Science", "Medicine", "Nursing", "Information Science"],
            "Public research university near a major technology hub.",
        ),
    ]
}
