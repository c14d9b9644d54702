use anyhow::Result;

pub fn execute(limit: usize, clear: bool, json: bool) -> Result<()> {
    let core = super::build_core()?;

    if clear {
        core.clear_history()?;
        println!("对话历史已清空");
        return Ok(());
    }

    let records = core.recent_history(limit)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("暂无对话历史");
        return Ok(());
    }

    for record in records {
        println!("[{}] 用户: {}", record.timestamp, record.user_input);
        println!("    助手: {}", record.response);
    }

    Ok(())
}
