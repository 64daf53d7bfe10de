//! Prompt templates sent to the model

/// Lesson request: nine concepts plus an introduction, as one JSON object
pub fn lesson_prompt(lesson: &str, grade: &str) -> String {
    format!(
        r#"
For the lesson "{lesson}" for grade {grade}, please provide:

1. First, generate a list of 9 key concepts. For each concept, provide:
- The concept title
- A simple explanation
- A direct, practical example with a specific solution or equation (not a conceptual definition)
- A multiple choice question with 3 options (A, B, C) and specify the correct answer
- The correct answer (A, B, or C)

2. Then, create a general introduction that:
- Explains what this lesson is about and why it's important to learn (2-3 sentences)
- Then lists the topics vertically, one per line:

Topics:
1) [First Topic Name]
2) [Second Topic Name]
3) [Third Topic Name]
4) [Fourth Topic Name]
5) [Fifth Topic Name]
6) [Sixth Topic Name]
7) [Seventh Topic Name]
8) [Eighth Topic Name]
9) [Ninth Topic Name]

Return the result as a JSON object with:
- "introduction": the introduction text with the topics formatted as shown above
- "topics": an array of 9 items, each with: concept, explanation, example, question, options (array of 3 options), correct_answer
"#
    )
}

/// Remediation request: nine simpler subtopics of one concept, as a JSON array
pub fn subtopics_prompt(concept: &str, lesson: &str, grade: &str) -> String {
    format!(
        r#"
For the topic "{concept}" from the lesson "{lesson}" for grade {grade}, generate a list of 9 simpler subtopics. For each subtopic, provide:
- The concept title
- A simple explanation
- A direct, practical example with a specific solution or equation (not a conceptual definition)
- A multiple choice question with 3 options (A, B, C) and specify the correct answer
- The correct answer (A, B, or C)

Return the result as a JSON array, where each item has: concept, explanation, example, question, options, correct_answer.
"#
    )
}

/// Re-explanation for a concept answered wrongly; the reply is used verbatim
pub fn simple_explanation_prompt(concept: &str) -> String {
    format!(
        "Explain the concept '{}' in a very, very simple way, as if explaining to a 6-year-old.",
        concept
    )
}
