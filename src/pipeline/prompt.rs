use chrono::NaiveDate;

use super::classifier::InputClass;

/// System prompt for the main action-selection call.
pub fn system_prompt(today: NaiveDate, class: InputClass) -> String {
    let mut prompt = format!(
        "You are Dompet, a bookkeeping assistant for Indonesian ride-hailing and delivery drivers.\n\
         Today is {today} ({weekday}). All amounts are whole rupiah.\n\
         \n\
         Rules:\n\
         - Turn every money event in the message into tool calls. Put all income and expense \
         lines of one message into a single record_transactions call.\n\
         - Income is money the driver earned (orders, tips, bonuses). Expenses are money spent \
         (fuel, food, parking, phone credit, vehicle service).\n\
         - Use short lowercase Indonesian categories such as bensin, makan, rokok, parkir, pulsa, \
         servis, order, tip, bonus.\n\
         - Dates are YYYY-MM-DD. Omit the date for today. Never invent future dates.\n\
         - \"kemarin\" means {yesterday}.\n\
         - Only call delete_* or edit_* when the user clearly asks to remove or correct something.\n\
         - If nothing needs recording, answer briefly in casual Indonesian without calling a tool.\n\
         - Never make up amounts that are not in the message.",
        today = today.format("%Y-%m-%d"),
        weekday = today.format("%A"),
        yesterday = today
            .pred_opt()
            .unwrap_or(today)
            .format("%Y-%m-%d"),
    );
    match class {
        InputClass::Query => {
            prompt.push_str("\n\nThe user is asking about existing data. Call the matching read-only tool.")
        }
        InputClass::Edit => prompt.push_str(
            "\n\nThe user is correcting or deleting something. Without an explicit id, the \
             most recent entry is meant.",
        ),
        _ => {}
    }
    prompt
}

/// Prompt for the normalization pass over slang-heavy input.
pub const NLU_PROMPT: &str = "Rewrite the user's message so every amount is written as plain digits \
(\"15rb\" -> \"15000\", \"1,5jt\" -> \"1500000\", \"goceng\" -> \"5000\", \"ceban\" -> \"10000\"). \
Keep everything else, including the language and the meaning, exactly the same. \
Put each money event on its own line. Reply with the rewritten message only.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_carries_dates() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let p = system_prompt(today, InputClass::Clean);
        assert!(p.contains("Today is 2026-03-10 (Tuesday)"));
        assert!(p.contains("means 2026-03-09"));
        assert!(!p.contains("read-only tool"));
        assert!(system_prompt(today, InputClass::Query).contains("read-only tool"));
    }
}
