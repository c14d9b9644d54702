use anyhow::Result;

pub fn execute(text: &str, json: bool) -> Result<()> {
    let core = super::build_core()?;
    let response = core.process(text)?;

    if json {
        let session = core.session_snapshot();
        let payload = serde_json::json!({
            "input": text,
            "intent": session.last_intent.map(|i| i.as_str()),
            "entities": session.last_entities,
            "response": response,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        println!("{response}");
    }

    Ok(())
}
