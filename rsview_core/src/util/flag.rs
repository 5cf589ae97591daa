//! Bitwise flags

#[macro_export]
macro_rules! flags_impl {
  ($vis:vis $name:ident,$unsigned:ty,$($field:tt),+) => {
    flags_impl!{@each($vis,$name,$unsigned,1){} $($field)+}
  };

  (@each($vis:vis,$name:ident,$unsigned:ty,$($inc:tt)*){$($collect:tt)*} $i:ident $($rest:tt)*) => {
    flags_impl! {@each($vis,$name,$unsigned,$($inc)*<<1){
      $($collect)*
      const $i = $($inc)*;
    } $($rest)*}
  };

  (@each($vis:vis,$name:ident,$unsigned:ty,$($inc:tt)*){$($collect:tt)*}) => {
    bitflags::bitflags! {
      #[derive(Copy, Clone, PartialEq, Eq)]
      $vis struct $name: $unsigned {
        $($collect)*
      }
    }

    impl std::fmt::Debug for $name {
      fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("({:b})", self.bits()))?;
        bitflags::parser::to_writer(self, f)
      }
    }
  };
}
