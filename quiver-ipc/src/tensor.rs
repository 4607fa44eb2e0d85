use itertools::Itertools;
use quiver_array::{PType, Tensor};
use quiver_error::{QuiverResult, quiver_bail, quiver_err};
use quiver_io::{MockOutputStream, QuiverReadAt, QuiverWrite};
use quiver_proto as pb;

use crate::{FrameLengths, IpcWriteOptions, Message, MessageBody, read_message_at, write_message};

/// Frame `tensor` as a tensor message and write it to `sink`.
///
/// Only tensors laid out in row-major order can be written.
pub fn write_tensor<W: QuiverWrite>(
    tensor: &Tensor,
    sink: &mut W,
    options: &IpcWriteOptions,
) -> QuiverResult<FrameLengths> {
    if !tensor.is_contiguous() {
        quiver_bail!(
            InvalidFormat: "cannot write tensor of shape [{}] with non-contiguous strides [{}]",
            tensor.shape().iter().join(", "),
            tensor.strides().iter().join(", ")
        )
    }
    let byte_length = usize::try_from(tensor.size())
        .ok()
        .and_then(|size| size.checked_mul(tensor.ptype().byte_width()))
        .ok_or_else(|| quiver_err!("tensor of {} elements is too large", tensor.size()))?;

    let mut body = MessageBody::new(options.alignment());
    let data = body.push(tensor.data().slice(..byte_length))?;
    let header = pb::Tensor {
        ptype: tensor.ptype().tag(),
        shape: tensor
            .shape()
            .iter()
            .enumerate()
            .map(|(i, size)| pb::TensorDim {
                size: *size,
                name: tensor.dim_name(i).to_string(),
            })
            .collect(),
        strides: tensor.strides().to_vec(),
        data: Some(data),
    };
    write_message(
        pb::message::Header::Tensor(header),
        &body,
        options.alignment(),
        sink,
    )
}

/// The number of bytes [`write_tensor`] would write for `tensor` at the start of a sink.
pub fn get_tensor_size(tensor: &Tensor, options: &IpcWriteOptions) -> QuiverResult<u64> {
    let mut sink = MockOutputStream::new();
    write_tensor(tensor, &mut sink, options)?;
    Ok(sink.extent_bytes_written())
}

/// Read the tensor message at `offset` of `source`.
///
/// The tensor's data is a slice of the message body.
pub fn read_tensor<R: QuiverReadAt>(offset: u64, source: &R) -> QuiverResult<Tensor> {
    tensor_from_message(&read_message_at(offset, source)?)
}

/// Decode the tensor carried by `message`.
pub fn tensor_from_message(message: &Message) -> QuiverResult<Tensor> {
    let header = message.expect_tensor()?;
    let ptype = PType::from_tag(header.ptype)?;
    let Some(location) = &header.data else {
        quiver_bail!(InvalidFormat: "tensor message has no data buffer")
    };
    let (Ok(offset), Ok(length)) = (
        u64::try_from(location.offset),
        u64::try_from(location.length),
    ) else {
        quiver_bail!(
            InvalidFormat: "invalid tensor data extent {}+{}",
            location.offset,
            location.length
        )
    };
    let data = message.body().try_slice(offset, length)?;

    let shape = header.shape.iter().map(|dim| dim.size).collect();
    let dim_names = if header.shape.iter().all(|dim| dim.name.is_empty()) {
        vec![]
    } else {
        header.shape.iter().map(|dim| dim.name.clone()).collect()
    };
    Tensor::try_new(ptype, data, shape, header.strides.clone(), dim_names)
        .map_err(|err| quiver_err!(InvalidFormat: "tensor message is inconsistent: {}", err))
}
