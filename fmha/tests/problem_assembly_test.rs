mod common;

use fmha::{
    LaunchConfig,
    backends::common::kernel::attention_backward::{
        HeadDimBucket, KernelVariant, ProblemSet, assemble, assemble_batched, assemble_offsets,
    },
};
use rand::{Rng, SeedableRng, rngs::StdRng};

fn cumulative(lengths: &[i32]) -> Vec<i32> {
    std::iter::once(0)
        .chain(lengths.iter().scan(0, |total, &length| {
            *total += length;
            Some(*total)
        }))
        .collect()
}

#[test]
fn test_two_element_batch() {
    let seqlens = [0, 3, 7];
    let request = common::request(&seqlens, &seqlens, 2, 4);
    let problems = assemble(&request).unwrap();
    assert_eq!(problems.len(), 2);

    assert_eq!(problems[0].query.lengths(), &[1, 2, 3, 4]);
    assert_eq!(problems[0].query.strides(), &[24, 4, 8, 1]);
    assert_eq!(problems[1].seq_len_q(), 4);
    assert_eq!(problems[1].seq_len_k(), 4);
    assert!(problems.iter().all(|problem| problem.acc0_bias.is_empty() && problem.acc1_bias.is_empty()));
}

#[test]
fn test_empty_element_is_kept() {
    let seqlens_q = [0, 0, 5];
    let seqlens_k = [0, 4, 9];
    let request = common::request(&seqlens_q, &seqlens_k, 2, 8);
    let problems = assemble(&request).unwrap();
    assert_eq!(problems.len(), 2);
    assert_eq!(problems[0].seq_len_q(), 0);
    assert_eq!(problems[0].query.element_span(), 0);
    assert_eq!(problems[0].seq_len_k(), 4);
    assert_eq!(problems[1].seq_len_q(), 5);
}

#[test]
fn test_lengths_match_offset_differences() {
    let mut rng = StdRng::seed_from_u64(5);
    for _ in 0..100 {
        let batch = rng.random_range(1..=8);
        let lengths_q: Vec<i32> = (0..batch).map(|_| rng.random_range(0..=32)).collect();
        let lengths_k: Vec<i32> = (0..batch).map(|_| rng.random_range(0..=32)).collect();
        let seqlens_q = cumulative(&lengths_q);
        let seqlens_k = cumulative(&lengths_k);
        let request = common::request(&seqlens_q, &seqlens_k, 3, 16);

        let problems = assemble(&request).unwrap();
        assert_eq!(problems.len(), batch);
        for ((problem, &m), &n) in problems.iter().zip(&lengths_q).zip(&lengths_k) {
            assert_eq!(problem.seq_len_q(), m as usize);
            assert_eq!(problem.seq_len_k(), n as usize);
            assert_eq!(problem.group_count(), 1);
            assert_eq!(problem.num_heads(), 3);
            assert_eq!(problem.head_dim(), 16);
        }
    }
}

#[test]
fn test_offsets() {
    let seqlens_q = [0, 3, 7];
    let seqlens_k = [0, 2, 8];
    let mut request = common::request(&seqlens_q, &seqlens_k, 2, 4);
    request.config = LaunchConfig {
        q_stride_multiplier: 3,
        kv_stride_multiplier: 3,
        ..LaunchConfig::default()
    };

    let offsets = assemble_offsets(&request).unwrap();
    assert_eq!(offsets[0].query, 0);
    assert_eq!(offsets[1].query, 3 * 2 * 4 * 3);
    assert_eq!(offsets[1].key, 2 * 2 * 4 * 3);
    assert_eq!(offsets[1].value, offsets[1].key);
    assert_eq!(offsets[1].output, 3 * 2 * 4);
    assert_eq!(offsets[1].softmax_lse, 3 * 2);
    assert_eq!(offsets[1].dropout_mask, 2 * 3 * 2);

    request.config.input_permute = false;
    let planar = assemble_offsets(&request).unwrap();
    assert_eq!(planar[1].query, 3 * 2 * 4);
    assert_eq!(planar[1].key, 2 * 2 * 4);
}

#[test]
fn test_batch_elements_do_not_overlap() {
    let mut rng = StdRng::seed_from_u64(23);
    for _ in 0..50 {
        let batch = rng.random_range(2..=6);
        let seqlens_q = cumulative(&(0..batch).map(|_| rng.random_range(0..=16)).collect::<Vec<_>>());
        let seqlens_k = cumulative(&(0..batch).map(|_| rng.random_range(0..=16)).collect::<Vec<_>>());
        let mut request = common::request(&seqlens_q, &seqlens_k, rng.random_range(1..=4), 8);
        request.config.input_permute = rng.random_bool(0.5);
        request.config.output_permute = rng.random_bool(0.5);
        request.config.q_stride_multiplier = rng.random_range(1..=3);
        request.config.kv_stride_multiplier = rng.random_range(1..=3);

        let problems = assemble(&request).unwrap();
        let offsets = assemble_offsets(&request).unwrap();
        for index in 1..batch {
            let (previous, current) = (&problems[index - 1], &offsets[index]);
            let previous_offsets = &offsets[index - 1];
            let regions = [
                ("query", previous_offsets.query, &previous.query, current.query),
                ("key", previous_offsets.key, &previous.key, current.key),
                ("value", previous_offsets.value, &previous.value, current.value),
                ("output", previous_offsets.output, &previous.output, current.output),
                ("dropout_mask", previous_offsets.dropout_mask, &previous.dropout_mask, current.dropout_mask),
                ("softmax_lse", previous_offsets.softmax_lse, &previous.softmax_lse, current.softmax_lse),
            ];
            for (name, previous_offset, descriptor, offset) in regions {
                let previous_end = previous_offset + descriptor.element_span();
                assert!(offset >= previous_end, "{name} of element {index} starts at {offset} before {previous_end}");
            }
        }
    }
}

#[test]
fn test_output_permute_is_independent() {
    let seqlens = [0, 3, 7];
    let mut request = common::request(&seqlens, &seqlens, 2, 4);

    request.config.input_permute = true;
    request.config.output_permute = false;
    let problem = &assemble(&request).unwrap()[0];
    assert_eq!(problem.output.strides(), &[24, 12, 4, 1]);
    assert_eq!(problem.query.strides(), &[24, 4, 8, 1]);
    assert_eq!(problem.key.strides(), &[24, 4, 8, 1]);
    assert_eq!(problem.value.strides(), &[24, 4, 1, 8]);
    assert_eq!(problem.dropout_mask.strides(), &[18, 3, 6, 1]);

    request.config.input_permute = false;
    request.config.output_permute = true;
    let problem = &assemble(&request).unwrap()[0];
    assert_eq!(problem.output.strides(), &[24, 4, 8, 1]);
    assert_eq!(problem.query.strides(), &[24, 12, 4, 1]);
    assert_eq!(problem.key.strides(), &[24, 12, 4, 1]);
    assert_eq!(problem.value.strides(), &[24, 12, 1, 4]);
    assert_eq!(problem.dropout_mask.strides(), &[18, 9, 3, 1]);
    assert_eq!(problem.softmax_lse.strides(), &[6, 3, 1]);
}

#[test]
fn test_oversized_request_is_rejected() {
    let seqlens_q = [0, 1 << 30];
    let seqlens_k = [0, 1];
    let mut request = common::request(&seqlens_q, &seqlens_k, 1 << 32, 128);
    assert_eq!(assemble_offsets(&request).unwrap_err().arg, "query");
    assert!(ProblemSet::for_variant(&request, KernelVariant::Grouped(HeadDimBucket::D128)).is_err());

    request.num_heads = 1 << 20;
    request.config.input_permute = false;
    assert!(request.check_extents().is_ok());
    request.config.input_permute = true;
    request.config.q_stride_multiplier = 1 << 20;
    assert_eq!(request.check_extents().unwrap_err().arg, "query");
}

#[test]
fn test_batched_problem() {
    let seqlens_q = [0, 4, 8, 12];
    let seqlens_k = [0, 6, 12, 18];
    let request = common::request(&seqlens_q, &seqlens_k, 2, 32);
    let problem = assemble_batched(&request).unwrap();
    assert_eq!(problem.group_count(), 3);
    assert_eq!(problem.query.lengths(), &[3, 2, 4, 32]);
    assert_eq!(problem.key.lengths(), &[3, 2, 6, 32]);

    let problem_set = ProblemSet::for_variant(&request, KernelVariant::Batched(HeadDimBucket::D32)).unwrap();
    assert_eq!(problem_set.len(), 1);
    assert_eq!(problem_set.required_elements().query, 12 * 2 * 32);
}

#[test]
fn test_batched_rejects_ragged_lengths() {
    let seqlens_q = [0, 3, 7];
    let request = common::request(&seqlens_q, &seqlens_q, 2, 32);
    let error = assemble_batched(&request).unwrap_err();
    assert_eq!(error.arg, "host_seqlens_q");
    assert!(ProblemSet::for_variant(&request, KernelVariant::Batched(HeadDimBucket::D32)).is_err());
}

#[test]
fn test_grouped_extents_cover_the_batch() {
    let seqlens_q = [0, 3, 7];
    let seqlens_k = [0, 5, 6];
    let request = common::request(&seqlens_q, &seqlens_k, 2, 4);
    let extents = ProblemSet::for_variant(&request, KernelVariant::Grouped(HeadDimBucket::D32))
        .unwrap()
        .required_elements();
    assert_eq!(extents.query, 7 * 2 * 4);
    assert_eq!(extents.key, 6 * 2 * 4);
    assert_eq!(extents.softmax_lse, 7 * 2);
    assert_eq!(extents.dropout_mask, 2 * 3 * 5 + 2 * 4 * 1);
}
