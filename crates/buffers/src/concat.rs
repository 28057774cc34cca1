//! Byte slice concatenation utilities.

/// Concatenates two byte slices into a new vector.
///
/// # Example
///
/// ```
/// use ecore_buffers::concat;
///
/// let result = concat(&[1, 2], &[3, 4]);
/// assert_eq!(result, vec![1, 2, 3, 4]);
/// ```
pub fn concat(a: &[u8], b: &[u8]) -> Vec<u8> {
    let mut res = Vec::with_capacity(a.len() + b.len());
    res.extend_from_slice(a);
    res.extend_from_slice(b);
    res
}

/// Concatenates a list of chunks into one contiguous buffer.
///
/// Chunked input (for example, a stream read piece by piece) is joined with
/// this before being handed to a decoder, which only works on whole buffers.
///
/// ```
/// use ecore_buffers::concat_list;
///
/// let result = concat_list(&[&[1, 2][..], &[3, 4][..], &[5][..]]);
/// assert_eq!(result, vec![1, 2, 3, 4, 5]);
/// ```
pub fn concat_list<T: AsRef<[u8]>>(list: &[T]) -> Vec<u8> {
    let total_size: usize = list.iter().map(|s| s.as_ref().len()).sum();
    let mut res = Vec::with_capacity(total_size);
    for item in list {
        res.extend_from_slice(item.as_ref());
    }
    res
}
