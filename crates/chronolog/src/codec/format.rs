use chronolog_core::Arg;

/// Substitute `{}` placeholders in `template` with `args`, in order.
///
/// `\{}` emits a literal `{}` and consumes no argument; `\\{}` emits one
/// backslash followed by the next argument. Placeholders past the last
/// argument are left as `{}` and surplus arguments are ignored.
pub fn format_message(template: &str, args: &[Arg]) -> String {
    if args.is_empty() && !template.contains('\\') {
        return template.to_string();
    }

    let mut out = String::with_capacity(template.len() + 16 * args.len());
    let mut args = args.iter();
    let mut rest = template;

    while let Some(pos) = rest.find("{}") {
        let (before, after) = rest.split_at(pos);
        let escapes = before.len() - before.trim_end_matches('\\').len();
        rest = &after[2..];

        match escapes {
            0 => {
                out.push_str(before);
                push_next(&mut out, &mut args);
            }
            1 => {
                out.push_str(&before[..before.len() - 1]);
                out.push_str("{}");
            }
            _ => {
                // A doubled escape is itself escaped.
                out.push_str(&before[..before.len() - 1]);
                push_next(&mut out, &mut args);
            }
        }
    }

    out.push_str(rest);
    out
}

fn push_next<'a>(out: &mut String, args: &mut impl Iterator<Item = &'a Arg>) {
    use std::fmt::Write;
    match args.next() {
        Some(arg) => {
            let _ = write!(out, "{}", arg);
        }
        None => out.push_str("{}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chronolog_core::Level;

    #[test]
    fn test_substitutes_in_order() {
        let args = vec![Arg::from("a"), Arg::from(2), Arg::from(Level::Warn)];
        assert_eq!(format_message("{} {} {}", &args), "a 2 WARN");
    }

    #[test]
    fn test_surplus_placeholders_and_args() {
        assert_eq!(format_message("x={} y={}", &[Arg::from(1)]), "x=1 y={}");
        assert_eq!(format_message("only {}", &[Arg::from(1), Arg::from(2)]), "only 1");
    }

    #[test]
    fn test_escaped_placeholder() {
        assert_eq!(format_message(r"\{} then {}", &[Arg::from(7)]), "{} then 7");
        assert_eq!(format_message(r"path \\{}", &[Arg::from("x")]), r"path \x");
    }

    #[test]
    fn test_null_and_object() {
        let args = vec![Arg::Null, Arg::object(&std::net::Ipv4Addr::LOCALHOST)];
        assert_eq!(format_message("{} at {}", &args), "null at 127.0.0.1");
    }

    #[test]
    fn test_plain_template_untouched() {
        assert_eq!(format_message("no placeholders", &[]), "no placeholders");
        assert_eq!(format_message("{}", &[]), "{}");
    }
}
