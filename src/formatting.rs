use std::fmt::Write as FmtWrite;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use sfh_lib::output::SFH_OUTPUT_VERSION;
use sfh_lib::types::VariantSelection;
use sfh_lib::{ErrorOutput, HarnessError, HarnessOutput};

use crate::cli::OutputFormat;

/// Write output in the requested format.
pub fn write_output(
    body: &HarnessOutput,
    format: OutputFormat,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Json => write_json_output(body, output.as_deref())?,
        OutputFormat::Pretty => write_pretty_output(body, output.as_deref())?,
    };
    Ok(())
}

/// Render an error and return the appropriate exit code.
pub fn render_error(err: HarnessError, format: OutputFormat, output: Option<PathBuf>) -> ExitCode {
    let payload = HarnessOutput::Error(ErrorOutput {
        version: SFH_OUTPUT_VERSION.to_string(),
        error: err.to_payload(),
    });

    match format {
        OutputFormat::Json => {
            let content =
                serde_json::to_string(&payload).unwrap_or_else(|_| "{\"mode\":\"error\"}".into());
            if let Some(path) = output {
                if let Err(write_err) = std::fs::write(&path, &content) {
                    eprintln!("Failed to write error output: {}", write_err);
                    println!("{content}");
                }
            } else {
                println!("{content}");
            }
        }
        OutputFormat::Pretty => {
            if let Err(write_err) = write_pretty_output(&payload, output.as_deref()) {
                eprintln!("Failed to write error output: {}", write_err);
            }
        }
    };

    // Exit code 2 is reserved for errors; failed checks use 1.
    ExitCode::from(2)
}

fn write_json_output(
    body: &HarnessOutput,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let content = serde_json::to_string(body)?;
    if let Some(path) = output {
        std::fs::write(path, content)?;
    } else {
        println!("{content}");
    }
    Ok(())
}

fn write_pretty_output(body: &HarnessOutput, output: Option<&Path>) -> io::Result<()> {
    let use_human = output.is_none() && std::io::stdout().is_terminal();

    if use_human {
        println!("{}", format_pretty(body, true));
        return Ok(());
    }

    // Non-tty or file output keeps the JSON shape.
    let content =
        serde_json::to_string_pretty(body).unwrap_or_else(|_| "{\"mode\":\"error\"}".to_string());
    if let Some(path) = output {
        std::fs::write(path, &content)?;
    } else {
        println!("{content}");
    }
    Ok(())
}

fn describe(selection: &VariantSelection) -> String {
    format!(
        "{} = {} ({})",
        selection.group.group_type, selection.option.value, selection.option.input_id
    )
}

/// Format output for human consumption in a terminal.
pub fn format_pretty(body: &HarnessOutput, colorize: bool) -> String {
    let mut buf = String::new();
    match body {
        HarnessOutput::Variants(out) => {
            writeln!(buf, "{} {}", color("[VARIANTS]", "36", colorize), out.url).ok();
            for group in &out.groups {
                writeln!(buf, "{}:", group.group_type).ok();
                for option in &group.options {
                    let mut flags = Vec::new();
                    if option.is_selected {
                        flags.push("selected");
                    }
                    if !option.is_available {
                        flags.push("unavailable");
                    }
                    let suffix = if flags.is_empty() {
                        String::new()
                    } else {
                        format!(" [{}]", flags.join(", "))
                    };
                    writeln!(buf, "- {:24} {}{}", option.name, option.input_id, suffix).ok();
                }
            }
        }
        HarnessOutput::Select(out) => {
            writeln!(
                buf,
                "{} {}",
                color("[SELECT]", "36", colorize),
                describe(&out.selection)
            )
            .ok();
            if out.verified {
                writeln!(buf, "Verified after reload").ok();
            }
            for group in &out.selected {
                let values: Vec<&str> = group.options.iter().map(|o| o.value.as_str()).collect();
                writeln!(buf, "- {:12} {}", group.group_type, values.join(", ")).ok();
            }
        }
        HarnessOutput::AddToCart(out) => {
            let (status, code) = if out.in_cart { ("PASS", "32") } else { ("FAIL", "31") };
            writeln!(buf, "{} Add to cart", color(status, code, colorize)).ok();
            writeln!(buf, "Selection: {}", describe(&out.selection)).ok();
            writeln!(
                buf,
                "Item: {} ({}) {}",
                out.item.name,
                out.item.variant_id,
                out.item.price.as_deref().unwrap_or("-")
            )
            .ok();
        }
        HarnessOutput::AddBundle(out) => {
            writeln!(buf, "{} Bundle added", color("[BUNDLE]", "36", colorize)).ok();
            for selection in &out.selections {
                writeln!(buf, "- {}", describe(selection)).ok();
            }
            writeln!(buf, "Cart lines: {}", out.cart_lines).ok();
        }
        HarnessOutput::Cart(out) => {
            writeln!(
                buf,
                "{} {} ({})",
                color("[CART]", "34", colorize),
                out.item.name,
                out.item.variant_id
            )
            .ok();
            if let Some(line) = &out.line {
                writeln!(buf, "Quantity: {}  Price: {}", line.quantity, line.item_price).ok();
            }
            if out.removed {
                writeln!(buf, "Removed").ok();
            }
            if let Some(checkout) = &out.checkout {
                let (status, code) = if checkout.loaded { ("PASS", "32") } else { ("FAIL", "31") };
                writeln!(
                    buf,
                    "{} Checkout ({:?}) {}",
                    color(status, code, colorize),
                    checkout.navigation,
                    checkout.url
                )
                .ok();
            }
        }
        HarnessOutput::Error(out) => {
            writeln!(buf, "{} {}", color("[ERROR]", "31", colorize), out.error.message).ok();
            if let Some(remediation) = &out.error.remediation {
                writeln!(buf, "Hint: {}", remediation).ok();
            }
        }
    }
    buf
}

fn color(text: &str, code: &str, colorize: bool) -> String {
    if colorize {
        format!("\x1b[{}m{}\x1b[0m", code, text)
    } else {
        text.to_string()
    }
}

/// 0 when the check passed, 1 when it ran but failed.
pub fn exit_code_for_check(passed: bool) -> ExitCode {
    if passed {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sfh_lib::error::{ErrorCategory, ErrorPayload};
    use sfh_lib::types::{AddToCartResult, VariantGroup, VariantOption};
    use sfh_lib::AddToCartOutput;

    #[test]
    fn exit_code_for_check_maps_pass_fail() {
        assert_eq!(exit_code_for_check(true), ExitCode::SUCCESS);
        assert_eq!(exit_code_for_check(false), ExitCode::from(1));
    }

    #[test]
    fn render_error_always_returns_fatal_exit_code() {
        let code = render_error(
            HarnessError::Config("boom".to_string()),
            OutputFormat::Json,
            None,
        );
        assert_eq!(code, ExitCode::from(2));
    }

    #[test]
    fn format_pretty_reports_add_to_cart_failure() {
        let option = VariantOption {
            name: "Sage".into(),
            value: "Sage".into(),
            is_selected: true,
            is_available: true,
            input_id: "c2".into(),
        };
        let output = HarnessOutput::AddToCart(AddToCartOutput {
            version: SFH_OUTPUT_VERSION.to_string(),
            selection: VariantSelection {
                group: VariantGroup::new("color", vec![option.clone()]),
                option,
            },
            item: AddToCartResult {
                variant_id: "417".into(),
                price: Some("$49.99 CAD".into()),
                name: "Cloud Zip Hoodie".into(),
            },
            in_cart: false,
        });

        let pretty = format_pretty(&output, false);
        assert!(pretty.contains("FAIL Add to cart"));
        assert!(pretty.contains("color = Sage (c2)"));
        assert!(pretty.contains("$49.99 CAD"));
    }

    #[test]
    fn format_pretty_handles_errors() {
        let output = HarnessOutput::Error(ErrorOutput {
            version: SFH_OUTPUT_VERSION.to_string(),
            error: ErrorPayload {
                category: ErrorCategory::Config,
                message: "bad input".to_string(),
                remediation: Some("check flags".to_string()),
            },
        });

        let pretty = format_pretty(&output, false);
        assert!(pretty.contains("[ERROR] bad input"));
        assert!(pretty.contains("Hint: check flags"));
    }
}
