use livedash_core::{ChartResponse, DashError, MutationResponse, Transport, mutation};

use crate::SourceArgs;

pub fn run(source: &SourceArgs, metric: &str, value: &str) {
    super::init_logging();
    let (config, transport) = super::connect(source);
    let rt = super::runtime();

    let outcome = rt.block_on(async {
        let body = transport.fetch_metrics().await?;
        let response = ChartResponse::parse(&body)?;
        if !response.success {
            return Err(DashError::ServerReported(
                response.error_msg.unwrap_or_default(),
            ));
        }

        let options = mutation::modifiable_options(&response);
        let Some(selected) = find_option(&options, metric) else {
            let names: Vec<&str> = options.iter().map(|o| o.name.as_str()).collect();
            return Err(DashError::Mutation(format!(
                "'{metric}' is not modifiable here (modifiable: {})",
                if names.is_empty() { "none".to_string() } else { names.join(", ") }
            )));
        };

        let request = mutation::build_request(&response, selected, value, &config.operation)?;
        let reply = MutationResponse::parse(&transport.submit_mutation(&request).await?)?;
        if !reply.success {
            return Err(DashError::Mutation(
                reply.error_msg.unwrap_or_else(|| "server rejected the change".into()),
            ));
        }
        Ok::<_, DashError>(request)
    });

    match outcome {
        Ok(request) => println!(
            "{} {} -> {} (index {})",
            request.operation, request.value, request.name, request.index
        ),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

/// Dropdown position for `wanted`, matched on name or label.
fn find_option(options: &[mutation::DropdownOption], wanted: &str) -> Option<usize> {
    options
        .iter()
        .position(|o| o.name == wanted)
        .or_else(|| {
            options
                .iter()
                .position(|o| o.label.eq_ignore_ascii_case(wanted))
        })
}
