use console::Style;
use fmha::backends::common::{
    gpu_types::TensorDescriptor,
    kernel::attention_backward::ProblemSet,
};

use crate::{
    error::CliError,
    request_file::{RequestSource, unbound_buffers},
};

fn format_descriptor(
    name: &str,
    descriptor: &TensorDescriptor,
) -> String {
    format!("    {name:<13} lengths {:?} strides {:?}", descriptor.lengths(), descriptor.strides())
}

/// Prints the problem list and buffer extents a request assembles to.
pub fn handle_describe(source: &RequestSource) -> Result<(), CliError> {
    let file = source.load()?;
    let variant = file.kernel_variant()?;
    let request = file.request(unbound_buffers(0));
    request.validate()?;
    let problem_set = ProblemSet::for_variant(&request, variant)?;

    let style_header = Style::new().bold();
    let style_dim = Style::new().dim();
    println!("{}", style_header.apply_to(format!("{variant} ({} problems)", problem_set.len())));
    println!(
        "{}",
        style_dim.apply_to(format!(
            "permute in/out {}/{}, multipliers q {} kv {}",
            request.input_permute(),
            request.output_permute(),
            request.config.q_stride_multiplier,
            request.config.kv_stride_multiplier
        ))
    );

    for (index, (problem, offsets)) in problem_set.problems.iter().zip(&problem_set.offsets).enumerate() {
        println!(
            "{}",
            style_header.apply_to(format!("problem {index}: M={} N={}", problem.seq_len_q(), problem.seq_len_k()))
        );
        println!("{}", format_descriptor("query", &problem.query));
        println!("{}", format_descriptor("key", &problem.key));
        println!("{}", format_descriptor("value", &problem.value));
        println!("{}", format_descriptor("output", &problem.output));
        println!("{}", format_descriptor("dropout_mask", &problem.dropout_mask));
        println!("{}", format_descriptor("softmax_lse", &problem.softmax_lse));
        println!("{}", style_dim.apply_to(format!("    offsets {offsets:?}")));
    }

    let extents = problem_set.required_elements();
    println!("{}", style_header.apply_to("required elements"));
    println!("    {extents:?}");
    Ok(())
}
