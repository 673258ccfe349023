/*!
 This module defines common utilities used by the codecs.
*/

pub mod dates;
