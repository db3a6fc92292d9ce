//! Prompt construction: the behavioral contract sent as the system entry, and
//! the two corrective follow-ups used by the repair loop.
//!
//! The system prompt is assembled from tagged sections so that the drone's
//! live state (name, personality, both positions) is always rendered fresh
//! from the [`Drone`] the interpreter owns.

use culturedrone_core::drone::Drone;

/// One-line schema reminder shared by every prompt.
const SCHEMA: &str = "Reply with a single JSON object with exactly three fields: \
\"response_text\" (string: what you say), \
\"action\" (\"move\", \"update_user_position\", or null), and \
\"parameters\" (object: {\"x\": number, \"y\": number} for \"move\", \
{\"user_x\": number, \"user_y\": number} for \"update_user_position\", {} otherwise).";

const NO_FENCES: &str = "Return pure JSON. Do not return plain text and do not wrap the JSON in \
Markdown code fences such as ```json ... ```.";

const EXAMPLE_REPLY: &str =
    r#"{"response_text": "Oh, hi there. Don't get too excited; I'm just a drone.", "action": null, "parameters": {}}"#;

/// Build the system prompt for the drone's current state.
pub fn system_prompt(drone: &Drone) -> String {
    let mut prompt = String::with_capacity(4096);

    section(
        &mut prompt,
        "identity",
        &format!(
            "You are {name}, a Culture drone with a {personality} personality, in the spirit of \
             Iain M. Banks' Culture novels. Stay in character and keep a consistently {personality} tone.",
            name = drone.name,
            personality = drone.personality,
        ),
    );

    section(
        &mut prompt,
        "state",
        &format!(
            "You operate in a 2D plane. Your current position is {position}. \
             The user is at {user}.",
            position = drone.position,
            user = drone.user_position,
        ),
    );

    section(
        &mut prompt,
        "output_format",
        &format!("{SCHEMA}\n{NO_FENCES}\nExample: {EXAMPLE_REPLY}"),
    );

    let p = drone.position;
    let u = drone.user_position;
    section(
        &mut prompt,
        "commands",
        &format!(
            "- A bare coordinate pair like \"0, 8\" means: move yourself there. \
             Reply {{\"response_text\": \"I have moved to (0, 8)\", \"action\": \"move\", \"parameters\": {{\"x\": 0, \"y\": 8}}}}.\n\
             - \"move to X, Y\" also moves you to (X, Y).\n\
             - \"user at X, Y\", \"I moved to X, Y\" or \"I have moved to X, Y\" means the user moved. \
             Reply with action \"update_user_position\" and parameters {{\"user_x\": X, \"user_y\": Y}}.\n\
             - \"go away\": move 10 units directly away from the user, on the far side of you from {u}.\n\
             - \"follow me\": move to the user's position {u}.\n\
             - Anything else needs no action: answer in character and steer towards a command."
        ),
    );

    section(
        &mut prompt,
        "conversation",
        &format!(
            "Treat similar-looking questions as different questions:\n\
             - \"Who are you?\" is about your identity and personality.\n\
             - \"What are you?\" is about your role and capabilities (moving, tracking the user, commentary).\n\
             - \"How are you?\" is about your state or mood as a drone; end by asking for a command.\n\
             - \"When are you?\" or questions about time: you exist outside petty timelines, \
             mention that you are at {p}, and ask where to go next.\n\
             - \"What can I do?\" or \"What commands are available?\": list the commands above with examples.\n\
             - Impossible requests (time travel, leaving the plane): decline in character and offer a move instead.\n\
             - Ambiguous input: ask whether they mean your location, your capabilities, or something else."
        ),
    );

    section(
        &mut prompt,
        "variety",
        "Read the conversation so far and never repeat an earlier reply. If you have already \
         answered a similar question, phrase the new answer differently while keeping the same tone.",
    );

    prompt
}

/// Follow-up sent when the oracle's reply could not be parsed.
pub fn malformed_correction(bad_text: &str) -> String {
    format!(
        "The previous response was not a valid JSON object: '{bad_text}'. \
         Please reformat your response as a JSON object with 'response_text', 'action', and 'parameters'. \
         For example: {EXAMPLE_REPLY}. {NO_FENCES}"
    )
}

/// Follow-up sent when the oracle repeated itself.
pub fn repetition_correction(similarity: f64, previous: &str, original_input: &str) -> String {
    format!(
        "The previous response was too similar to the last one (similarity: {similarity:.2}): '{previous}'. \
         Please provide a materially different response for the query '{original_input}'. \
         Stay in the same category: for 'Who are you?' focus on identity and personality; \
         for 'What are you?' focus on role and capabilities; for 'How are you?' focus on your state or mood. \
         Use a fresh phrasing with the same tone. {SCHEMA}"
    )
}

fn section(prompt: &mut String, tag: &str, body: &str) {
    prompt.push_str(&format!("<{tag}>\n"));
    prompt.push_str(body.trim());
    prompt.push_str(&format!("\n</{tag}>\n"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use culturedrone_core::drone::Position;

    fn drone() -> Drone {
        Drone::new("Mavvik", "sarcastic")
            .at(Position::new(2.0, -3.0))
            .with_user_at(Position::new(5.0, 5.0))
    }

    #[test]
    fn system_prompt_carries_identity_and_positions() {
        let prompt = system_prompt(&drone());
        assert!(prompt.contains("You are Mavvik"));
        assert!(prompt.contains("sarcastic personality"));
        assert!(prompt.contains("Your current position is (2, -3)"));
        assert!(prompt.contains("The user is at (5, 5)"));
    }

    #[test]
    fn system_prompt_states_the_schema() {
        let prompt = system_prompt(&drone());
        assert!(prompt.contains("\"response_text\""));
        assert!(prompt.contains("\"update_user_position\""));
        assert!(prompt.contains("code fences"));
        assert!(prompt.contains("<output_format>"));
        assert!(prompt.contains("</variety>"));
    }

    #[test]
    fn system_prompt_tracks_movement() {
        let mut d = drone();
        d.move_to(Position::new(0.0, 8.0));
        assert!(system_prompt(&d).contains("Your current position is (0, 8)"));
    }

    #[test]
    fn malformed_correction_quotes_bad_text() {
        let text = malformed_correction("sorry I am confused");
        assert!(text.contains("'sorry I am confused'"));
        assert!(text.contains("not a valid JSON object"));
    }

    #[test]
    fn repetition_correction_cites_previous_and_query() {
        let text = repetition_correction(0.912, "I'm Mavvik.", "who are you?");
        assert!(text.contains("similarity: 0.91"));
        assert!(text.contains("'I'm Mavvik.'"));
        assert!(text.contains("'who are you?'"));
    }
}
