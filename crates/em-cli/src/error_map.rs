use em_api::{BuildReport, EndermiteError};

pub(crate) fn report_for(error: &anyhow::Error) -> BuildReport {
    match error
        .chain()
        .find_map(|cause| cause.downcast_ref::<EndermiteError>())
    {
        Some(error) => BuildReport::from_error(error),
        None => BuildReport {
            code: "CLI_ERROR".to_string(),
            labels: Vec::new(),
            causes: error.chain().skip(1).map(ToString::to_string).collect(),
        },
    }
}

pub(crate) fn emit_error(error: anyhow::Error) -> i32 {
    let report = report_for(&error);
    println!("RESULT:ERROR");
    println!("ERROR_CODE:{}", report.code);
    println!("ERROR_MSG_JSON:{}", json_string(&error.to_string()));
    println!("REPORT_JSON:{}", json_string(&report.headline()));
    for cause in &report.causes {
        println!("CAUSE_JSON:{}", json_string(cause));
    }
    1
}

pub(crate) fn json_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}
