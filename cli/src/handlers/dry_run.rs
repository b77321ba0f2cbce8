use console::Style;
use fmha::backends::{
    common::{
        Stream,
        kernel::attention_backward::{AttentionBackwardEngine, AttentionBackwardLauncher, ProblemSet},
    },
    host::{Host, HostContext, HostDevice},
};

use crate::{
    error::CliError,
    request_file::{RequestSource, unbound_buffers},
};

const DEVICE_ID: u32 = 0;

/// Launches a request on the host backend and reports what was enqueued.
pub fn handle_dry_run(
    source: &RequestSource,
    memory_limit: Option<usize>,
) -> Result<(), CliError> {
    let file = source.load()?;
    let variant = file.kernel_variant()?;

    let device = match memory_limit {
        Some(limit) => HostDevice::with_memory_limit(DEVICE_ID, limit),
        None => HostDevice::new(DEVICE_ID),
    };
    let context = HostContext::new(device);
    let stream = context.create_stream();

    let mut request = file.request(unbound_buffers(DEVICE_ID));
    request.validate()?;
    let extents = ProblemSet::for_variant(&request, variant)?.required_elements();
    let (_tensors, buffers) =
        context.create_attention_backward_buffers(request.data_type, &extents, file.with_dropout_mask)?;
    request.buffers = buffers;

    let mut launcher = AttentionBackwardLauncher::<Host>::new(context.clone(), variant)?;
    let outcome = launcher.run(&request, &stream)?;
    stream.wait_until_completed();

    let style_title = Style::new().bold();
    let style_value = Style::new().green();
    println!("{}", style_title.apply_to(launcher.engine().type_string()));
    println!("  problems   {}", style_value.apply_to(outcome.problem_count));
    println!("  workspace  {} bytes", style_value.apply_to(outcome.workspace_bytes));
    if let Some(time) = outcome.average_time_ms {
        println!("  time       {} ms", style_value.apply_to(format!("{time:.4}")));
    }
    for launch in stream.completed() {
        println!("  launch #{} with {} group records", launch.sequence, launch.groups.len());
        for (index, group) in launch.groups.iter().enumerate() {
            println!(
                "    {index}: q {:?} @ {}, k {:?} @ {}, lse @ {}",
                group.q_lengths, group.q_offset, group.k_lengths, group.k_offset, group.lse_offset
            );
        }
    }
    Ok(())
}
