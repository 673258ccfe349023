/*!
 Errors that can happen when reading or writing property list data.
*/

pub mod binary;
pub mod plist;
