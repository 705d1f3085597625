// Prompt templates for the three pipelines, built as directive trees and
// rendered by `crate::prompt`. The JSON-only system prompt and the output
// schema hint are appended by the generation client, so these templates carry
// only the role framing and the interpolated user data.

use crate::prompt::{Directive, PromptTemplate};

/// Career-path suggestion. Interpolates the user's background and asks for
/// three distinct, diverse paths.
pub fn career_paths_template() -> PromptTemplate {
    PromptTemplate::new(
        "career-path-suggestion",
        vec![
            Directive::lit(
                "You are a career advisor. A user will provide their skills, \
                 experience, and education. You will return three possible \
                 career paths for them.\n\n",
            ),
            Directive::lit("Skills: "),
            Directive::field("skills"),
            Directive::lit("\nExperience: "),
            Directive::field("experience"),
            Directive::lit("\nEducation: "),
            Directive::field("education"),
            Directive::lit(
                "\n\nReturn three diverse career paths that are suited to the \
                 user's background. Make the career paths distinct from each \
                 other. Each career path should include a title and a brief \
                 description.",
            ),
        ],
    )
}

/// Roadmap expansion for a chosen path. The skills block is conditional: an
/// empty skill list renders the "None" branch and emits no iteration body.
pub fn roadmap_template() -> PromptTemplate {
    PromptTemplate::new(
        "career-path-roadmap",
        vec![
            Directive::lit(
                "You are an expert career advisor. A user is interested in the \
                 following career path: ",
            ),
            Directive::field("careerPath"),
            Directive::lit(".\n\nThe user currently has the following skills:\n"),
            Directive::when_else(
                "userSkills",
                vec![Directive::each(
                    "userSkills",
                    vec![
                        Directive::lit("- "),
                        Directive::field("this"),
                        Directive::lit("\n"),
                    ],
                )],
                vec![Directive::lit("None\n")],
            ),
            Directive::lit(
                "\nProvide a detailed roadmap of milestones to progress along \
                 that path. Lay out all the steps required to get there, \
                 including advanced skill levels, internships, and specific \
                 educational requirements. Be specific and actionable.\n\
                 Group the steps under ordered milestones. Mark a step's \
                 isCompleted flag true only when the skill it implies is \
                 already covered by the user's listed skills; otherwise mark \
                 it false.",
            ),
        ],
    )
}

/// Resume parsing. The document travels on the attachment channel, not in the
/// prompt text; pre-filled name and number blocks render only when provided.
pub fn resume_parser_template() -> PromptTemplate {
    PromptTemplate::new(
        "resume-parser",
        vec![
            Directive::lit(
                "You are an expert resume parser. Your task is to extract \
                 structured information from the attached resume document.\n\n\
                 - Prioritize the separately provided full name and mobile \
                 number if they exist, as they are likely more accurate.\n\
                 - If they are not provided, extract them from the resume text.\n\
                 - Extract all other fields (email, headline, skills, \
                 experience, education) from the resume.\n\
                 - For experience and education, summarize them neatly but keep \
                 all essential information like job titles, company names, \
                 dates, degrees, and institutions. Preserve formatting like \
                 bullet points from the original resume.\n\
                 - For skills, extract a list of individual skill names with no \
                 descriptions.\n",
            ),
            Directive::attach("resumeDataUri"),
            Directive::when(
                "fullName",
                vec![
                    Directive::lit("\nPre-filled Full Name: "),
                    Directive::field("fullName"),
                    Directive::lit("\n"),
                ],
            ),
            Directive::when(
                "mobileNumber",
                vec![
                    Directive::lit("\nPre-filled Mobile Number: "),
                    Directive::field("mobileNumber"),
                    Directive::lit("\n"),
                ],
            ),
        ],
    )
}
