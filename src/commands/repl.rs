use std::io::{self, BufRead, Write};

use anyhow::Result;

/// Words that end the conversation without a turn through the pipeline.
const EXIT_WORDS: [&str; 5] = ["退出", "关闭", "再见", "停止", "结束"];

pub fn execute() -> Result<()> {
    let core = super::build_core()?;

    println!("语音助手已启动，您可以开始输入了（输入\"退出\"结束程序）:");

    let stdin = io::stdin();
    loop {
        print!("\n用户: ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            // EOF
            break;
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        if EXIT_WORDS.iter().any(|w| input.contains(w)) {
            println!("再见，期待与您再次交流");
            break;
        }

        let response = core.process(input)?;
        println!("助手: {response}");
    }

    Ok(())
}
