use crate::backend::Backend;
use crate::render::render;
use ledger_core::{Operation, Request};
use std::io::{BufRead, Write};

pub const MENU: &str = "\
0. View basic blockchain status.
1. Add a transaction to the blockchain.
2. Verify the blockchain.
3. View the blockchain.
4. Corrupt the chain.
5. Hide the corruption by repairing the chain.
6. Exit";

/// Read one trimmed line; `None` at end of input.
fn read_line<R: BufRead>(input: &mut R) -> std::io::Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Print `prompt` and read lines until one parses as `T`.
fn ask<R, W, T>(input: &mut R, out: &mut W, prompt: &str) -> anyhow::Result<Option<T>>
where
    R: BufRead,
    W: Write,
    T: std::str::FromStr,
{
    loop {
        writeln!(out, "{prompt}")?;
        out.flush()?;
        let Some(line) = read_line(input)? else {
            return Ok(None);
        };
        match line.parse() {
            Ok(value) => return Ok(Some(value)),
            Err(_) => writeln!(out, "Not a valid number: {line}")?,
        }
    }
}

fn ask_text<R: BufRead, W: Write>(input: &mut R, out: &mut W, prompt: &str) -> anyhow::Result<Option<String>> {
    writeln!(out, "{prompt}")?;
    out.flush()?;
    Ok(read_line(input)?)
}

/// Prompt for the fields an operation needs. `None` when input ran out.
fn build_request<R: BufRead, W: Write>(
    op: Operation,
    input: &mut R,
    out: &mut W,
) -> anyhow::Result<Option<Request>> {
    let request = match op {
        Operation::Status => Request::Status,
        Operation::Add => {
            let Some(difficulty) = ask::<_, _, u32>(input, out, "Enter difficulty > 0")? else {
                return Ok(None);
            };
            let Some(data) = ask_text(input, out, "Enter transaction")? else {
                return Ok(None);
            };
            Request::Add { difficulty, data }
        }
        Operation::Verify => Request::Verify,
        Operation::View => {
            writeln!(out, "View the Blockchain")?;
            Request::View
        }
        Operation::Corrupt => {
            writeln!(out, "corrupt the Blockchain")?;
            let Some(block_id) = ask::<_, _, i64>(input, out, "Enter block ID of block to corrupt")? else {
                return Ok(None);
            };
            let prompt = format!("Enter new data for block {block_id}");
            let Some(data) = ask_text(input, out, &prompt)? else {
                return Ok(None);
            };
            Request::Corrupt { block_id, data }
        }
        Operation::Repair => Request::Repair,
        Operation::Exit => Request::Exit,
    };
    Ok(Some(request))
}

/// The interactive loop. Ends on the exit choice or at end of input.
pub async fn run<R: BufRead, W: Write>(backend: &mut Backend, input: &mut R, out: &mut W) -> anyhow::Result<()> {
    loop {
        writeln!(out, "{MENU}")?;
        out.flush()?;
        let Some(choice) = read_line(input)? else {
            return Ok(());
        };
        let Some(op) = choice.parse().ok().and_then(Operation::from_code) else {
            writeln!(out, "Please choose an option from 0 to 6.")?;
            continue;
        };
        if op == Operation::Exit {
            return Ok(());
        }
        let Some(request) = build_request(op, input, out)? else {
            return Ok(());
        };
        if let Some(response) = backend.send(request).await? {
            render(&response, out)?;
        }
    }
}
